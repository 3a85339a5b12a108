//! Random expense generation for benchmarks and stress runs.

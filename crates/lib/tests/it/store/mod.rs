mod lifecycle_tests;
mod persistence_tests;

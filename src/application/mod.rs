// Application layer: orchestration of load / solve / write over one backend

pub mod facade;

pub use facade::Solver;

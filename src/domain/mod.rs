// Domain layer - Dashboard model and pure layout/binding logic
pub mod grid;
pub mod layout;
pub mod series;
pub mod station;
pub mod timerange;

//! Parameter balancing for kinetic models of cell metabolism.
//!
//! Given a reaction network and heterogeneous, partially redundant and noisy
//! measurements of biochemical quantities, this library computes a
//! thermodynamically consistent maximum-a-posteriori estimate for every
//! quantity a kinetic model needs, with posterior uncertainties. Derived
//! quantities (equilibrium constants, catalytic constants, maximal
//! velocities) are deterministic functions of a smaller independent basis,
//! so Haldane and Wegscheider constraints hold by construction.
//!
//! References:
//! - Lubitz T, Schulz M, Klipp E, Liebermeister W. J Phys Chem B. 2010;114:16298-16303
//! - Liebermeister W, Klipp E. Theor Biol Med Model. 2006;3:41

pub mod balancing;
pub mod catalog;
pub mod config;
pub mod error;
pub mod kinetics;
pub mod network;
pub mod observations;
pub mod tables;

pub use balancing::results::{BalancedQuantity, ResultRow};
pub use balancing::{Balancer, BalancingOutcome, RunLog};
pub use catalog::{QuantityCatalog, QuantityKind};
pub use config::BalancingConfig;
pub use error::BalanceError;
pub use network::{read_network, NetworkIndex, NetworkModel};
pub use observations::{Observation, ObservationRow, QuantityAddress};

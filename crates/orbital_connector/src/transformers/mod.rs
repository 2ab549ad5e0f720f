//! Request composition for every Orbital operation.

pub(crate) mod common;
mod mark_for_capture;
mod new_order;
mod profile;
mod reversal;

pub use mark_for_capture::MarkForCaptureData;
pub use new_order::{NewOrderData, NewOrderFlow};
pub use profile::{ProfileAction, ProfileData};
pub use reversal::ReversalData;

use crate::{configs::OrbitalSettings, types::MinorUnit};

/// Everything a request builder needs: adapter settings, the amount in minor units
/// and the operation specific data.
#[derive(Debug)]
pub struct OrbitalRouterData<'a, T> {
    pub settings: &'a OrbitalSettings,
    pub amount: MinorUnit,
    pub router_data: T,
}

impl<'a, T> From<(&'a OrbitalSettings, MinorUnit, T)> for OrbitalRouterData<'a, T> {
    fn from((settings, amount, router_data): (&'a OrbitalSettings, MinorUnit, T)) -> Self {
        Self {
            settings,
            amount,
            router_data,
        }
    }
}

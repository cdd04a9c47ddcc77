use rand::Rng;

use crate::{ChangeMacError, MacAddress};

/// First octet of every generated address: locally administered, unicast.
pub const RANDOM_MAC_FIRST_OCTET: u8 = 0x02;

pub fn generate_random_mac() -> Result<MacAddress, ChangeMacError> {
    generate_random_mac_with(&mut rand::thread_rng())
}

pub fn generate_random_mac_with<R: Rng + ?Sized>(
    rng: &mut R,
) -> Result<MacAddress, ChangeMacError> {
    let mut mac = [0u8; 6];

    rng.try_fill(&mut mac[1..])?;

    mac[0] = RANDOM_MAC_FIRST_OCTET;

    Ok(MacAddress::from(mac))
}

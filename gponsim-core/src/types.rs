//! Common types used throughout GponSim

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// MAC Address (6 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MacAddr(pub [u8; 6]);

impl MacAddr {
    /// Create a new MAC address
    pub const fn new(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }

    /// Broadcast MAC address (ff:ff:ff:ff:ff:ff)
    pub const fn broadcast() -> Self {
        Self([0xff, 0xff, 0xff, 0xff, 0xff, 0xff])
    }

    /// Zero MAC address (00:00:00:00:00:00)
    pub const fn zero() -> Self {
        Self([0x00, 0x00, 0x00, 0x00, 0x00, 0x00])
    }

    /// Get bytes as slice
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Convert to array
    pub fn octets(&self) -> [u8; 6] {
        self.0
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}

impl FromStr for MacAddr {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 6 {
            return Err(crate::Error::protocol("Invalid MAC address format"));
        }

        let mut bytes = [0u8; 6];
        for (i, part) in parts.iter().enumerate() {
            bytes[i] = u8::from_str_radix(part, 16)
                .map_err(|_| crate::Error::protocol("Invalid MAC address hex"))?;
        }

        Ok(MacAddr(bytes))
    }
}

impl TryFrom<String> for MacAddr {
    type Error = crate::Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<MacAddr> for String {
    fn from(mac: MacAddr) -> Self {
        mac.to_string()
    }
}

/// Device type tag for the simulated access network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceType {
    /// Optical Line Terminal (head-end)
    Olt,
    /// Optical Network Terminal (subscriber-end)
    Ont,
    /// Optical splitter
    Splitter,
    /// CPE router
    Router,
    /// CPE client (PC, phone)
    Client,
    /// Provider switch
    Switch,
    /// Infrastructure server (DHCP, DNS, AAA, ...)
    Server,
}

impl DeviceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Olt => "OLT",
            DeviceType::Ont => "ONT",
            DeviceType::Splitter => "Splitter",
            DeviceType::Router => "Router",
            DeviceType::Client => "Client",
            DeviceType::Switch => "Switch",
            DeviceType::Server => "Server",
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceType {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OLT" => Ok(DeviceType::Olt),
            "ONT" => Ok(DeviceType::Ont),
            "Splitter" => Ok(DeviceType::Splitter),
            "Router" => Ok(DeviceType::Router),
            "Client" => Ok(DeviceType::Client),
            "Switch" => Ok(DeviceType::Switch),
            "Server" => Ok(DeviceType::Server),
            _ => Err(crate::Error::protocol(format!(
                "Unknown device type '{s}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mac_addr_display_roundtrip() {
        let mac = MacAddr([0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]);
        assert_eq!(mac.to_string(), "aa:bb:cc:dd:ee:ff");
        assert_eq!("aa:bb:cc:dd:ee:ff".parse::<MacAddr>().unwrap(), mac);
    }

    #[test]
    fn mac_addr_rejects_bad_input() {
        assert!("aa:bb:cc".parse::<MacAddr>().is_err());
        assert!("zz:bb:cc:dd:ee:ff".parse::<MacAddr>().is_err());
    }

    #[test]
    fn device_type_parse() {
        assert_eq!("ONT".parse::<DeviceType>().unwrap(), DeviceType::Ont);
        assert_eq!(DeviceType::Client.as_str(), "Client");
        assert!("Toaster".parse::<DeviceType>().is_err());
    }
}

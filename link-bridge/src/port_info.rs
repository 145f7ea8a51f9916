//! Serial port listing for `teamlink ports`

use serialport::{SerialPortInfo, SerialPortType};

/// A serial port available on this machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    /// Port name (e.g., /dev/ttyUSB0, COM3)
    pub port: String,
    /// USB Vendor ID (if USB)
    pub vid: Option<u16>,
    /// USB Product ID (if USB)
    pub pid: Option<u16>,
    /// USB product string
    pub product: Option<String>,
}

impl PortInfo {
    fn from_serialport(info: SerialPortInfo) -> Self {
        match info.port_type {
            SerialPortType::UsbPort(usb) => Self {
                port: info.port_name,
                vid: Some(usb.vid),
                pid: Some(usb.pid),
                product: usb.product,
            },
            _ => Self {
                port: info.port_name,
                vid: None,
                pid: None,
                product: None,
            },
        }
    }

    /// Label for listing
    ///
    /// - USB ports: "ttyUSB0 [1A86:7523] (Product Name)"
    /// - Other ports: just the port name
    pub fn display_label(&self) -> String {
        let mut label = self.port.clone();
        if let (Some(vid), Some(pid)) = (self.vid, self.pid) {
            label.push_str(&format!(" [{vid:04X}:{pid:04X}]"));
        }
        if let Some(product) = &self.product {
            label.push_str(&format!(" ({product})"));
        }
        label
    }
}

/// Enumerate serial ports, sorted by name
pub fn available_ports() -> Result<Vec<PortInfo>, serialport::Error> {
    let mut ports: Vec<_> = serialport::available_ports()?
        .into_iter()
        .map(PortInfo::from_serialport)
        .collect();
    ports.sort_by(|a, b| a.port.cmp(&b.port));
    Ok(ports)
}

use serde::{Deserialize, Serialize};
use std::fmt;

/// Channel intensities as the server reports them, 16 bits each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb16 {
    pub red: u16,
    pub green: u16,
    pub blue: u16,
}

impl Rgb16 {
    pub fn new(red: u16, green: u16, blue: u16) -> Self {
        Self { red, green, blue }
    }

    /// Scale floating point channels in `0.0..=1.0` up to 16 bits.
    pub fn from_unit(red: f64, green: f64, blue: f64) -> Self {
        fn scale(v: f64) -> u16 {
            (v.clamp(0.0, 1.0) * f64::from(u16::MAX)).round() as u16
        }
        Self::new(scale(red), scale(green), scale(blue))
    }
}

/// Keep the high byte of a 16-bit channel.
pub fn truncate_channel(value: u16) -> u8 {
    (value >> 8) as u8
}

/// A picked colour, 8 bits per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Color {
    pub fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// `#rrggbb`, lowercase.
    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.red, self.green, self.blue)
    }

    /// `r,g,b` in decimal.
    pub fn decimal(&self) -> String {
        format!("{},{},{}", self.red, self.green, self.blue)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        #[derive(Serialize)]
        struct Report<'a> {
            hex: &'a str,
            #[serde(flatten)]
            color: &'a Color,
        }

        let hex = self.hex();
        serde_json::to_string(&Report { hex: &hex, color: self })
    }
}

impl From<Rgb16> for Color {
    fn from(c: Rgb16) -> Self {
        Self {
            red: truncate_channel(c.red),
            green: truncate_channel(c.green),
            blue: truncate_channel(c.blue),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.hex())
    }
}

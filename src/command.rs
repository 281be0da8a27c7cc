// src/command.rs
//
// Outbound command alphabet understood by the firmware on the far side of
// the HC-05 link. The actuator commands are single characters with no line
// terminator; the LCD frame is a marker-prefixed 32-character payload.

use crate::lcd;

/// A command to transmit to the device.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// `1` - turn the LED on
    LedOn,
    /// `2` - turn the LED off
    LedOff,
    /// `3` - move the servo to 0 degrees
    ServoZero,
    /// `4` - move the servo to 90 degrees
    ServoNinety,
    /// `#:<16 chars><16 chars>\n` - show two lines of text on the LCD
    Lcd { line1: String, line2: String },
}

impl Command {
    /// Encode the command into the bytes to put on the wire. LCD text is
    /// validated here; invalid text never produces a frame.
    pub fn encode(&self) -> Result<Vec<u8>, String> {
        match self {
            Command::LedOn => Ok(b"1".to_vec()),
            Command::LedOff => Ok(b"2".to_vec()),
            Command::ServoZero => Ok(b"3".to_vec()),
            Command::ServoNinety => Ok(b"4".to_vec()),
            Command::Lcd { line1, line2 } => {
                lcd::encode_display(line1, line2).map(String::into_bytes)
            }
        }
    }

    /// Short human-readable label for status reporting.
    pub fn label(&self) -> &'static str {
        match self {
            Command::LedOn => "LED on",
            Command::LedOff => "LED off",
            Command::ServoZero => "servo 0°",
            Command::ServoNinety => "servo 90°",
            Command::Lcd { .. } => "LCD text",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actuator_commands_are_single_bytes() {
        assert_eq!(Command::LedOn.encode().unwrap(), b"1");
        assert_eq!(Command::LedOff.encode().unwrap(), b"2");
        assert_eq!(Command::ServoZero.encode().unwrap(), b"3");
        assert_eq!(Command::ServoNinety.encode().unwrap(), b"4");
    }

    #[test]
    fn test_lcd_command_encodes_frame() {
        let cmd = Command::Lcd {
            line1: "Hola".to_string(),
            line2: "Mundo".to_string(),
        };
        assert_eq!(
            cmd.encode().unwrap(),
            b"#:Hola            Mundo           \n"
        );
    }

    #[test]
    fn test_lcd_command_rejects_invalid_text() {
        let cmd = Command::Lcd {
            line1: "señal".to_string(),
            line2: String::new(),
        };
        assert!(cmd.encode().is_err());
    }
}

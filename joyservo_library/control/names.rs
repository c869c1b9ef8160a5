//! Human-readable names for controller buttons and axes (event log only)

use std::borrow::Cow;

use joyservo_core::ControllerKind;

fn ps3_button(code: u16) -> Option<&'static str> {
    Some(match code {
        304 => "Cross (✕)",
        305 => "Circle (○)",
        307 => "Triangle (△)",
        308 => "Square (□)",
        294 => "L1",
        295 => "R1",
        298 => "L2",
        299 => "R2",
        300 => "D-Pad Up",
        301 => "D-Pad Right",
        302 => "D-Pad Down",
        303 => "D-Pad Left",
        288 => "Select",
        291 => "Start",
        292 => "PS Button",
        296 => "L3",
        297 => "R3",
        _ => return None,
    })
}

fn xbox_button(code: u16) -> Option<&'static str> {
    Some(match code {
        304 => "A",
        305 => "B",
        308 => "X",
        307 => "Y",
        310 => "Left Shoulder",
        311 => "Right Shoulder",
        314 => "Select/Back",
        315 => "Start",
        316 => "Xbox Button",
        317 => "Left Thumb",
        318 => "Right Thumb",
        544 => "D-Pad Up",
        545 => "D-Pad Down",
        546 => "D-Pad Left",
        547 => "D-Pad Right",
        16 => "Q",
        _ => return None,
    })
}

pub fn button_name(kind: ControllerKind, code: u16) -> Cow<'static, str> {
    let known = match kind {
        ControllerKind::Ps3 => ps3_button(code),
        _ => xbox_button(code),
    };
    match known {
        Some(name) => Cow::Borrowed(name),
        None => Cow::Owned(format!("Unknown ({})", code)),
    }
}

pub fn axis_name(kind: ControllerKind, code: u16) -> Cow<'static, str> {
    let known = match (kind, code) {
        (_, 0) => Some("Left Stick X"),
        (_, 1) => Some("Left Stick Y"),
        (ControllerKind::Ps3, 2) => Some("Right Stick X"),
        (ControllerKind::Ps3, 3) => Some("Right Stick Y"),
        (_, 2) => Some("Z Axis"),
        (_, 3) => Some("RX Axis"),
        (_, 4) => Some("Right Stick Y"),
        (_, 5) => Some("Right Stick X"),
        (_, 16) => Some("D-pad X"),
        (_, 17) => Some("D-pad Y"),
        _ => None,
    };
    match known {
        Some(name) => Cow::Borrowed(name),
        None => Cow::Owned(format!("Unknown Axis ({})", code)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_code_differs_by_layout() {
        assert_eq!(button_name(ControllerKind::Ps3, 304), "Cross (✕)");
        assert_eq!(button_name(ControllerKind::Xbox, 304), "A");
        assert_eq!(button_name(ControllerKind::Generic, 316), "Xbox Button");
    }

    #[test]
    fn test_unknown_codes() {
        assert_eq!(button_name(ControllerKind::Ps3, 999), "Unknown (999)");
        assert_eq!(axis_name(ControllerKind::Xbox, 40), "Unknown Axis (40)");
    }
}

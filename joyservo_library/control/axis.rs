//! Axis transform: raw stick value → angle → PWM pulse
//!
//! Everything here is total. Out-of-range input is clamped, never rejected.

/// Most negative stick reading that maps to 0°
pub const AXIS_MIN: i32 = -32767;
/// Stick reading that maps to 180°
pub const AXIS_MAX: i32 = 32767;

pub const ANGLE_MIN: u8 = 0;
pub const ANGLE_MAX: u8 = 180;
pub const ANGLE_CENTER: u8 = 90;

/// Clamp any integer into the servo's angular range
pub fn clamp_angle(angle: i64) -> u8 {
    angle.clamp(ANGLE_MIN as i64, ANGLE_MAX as i64) as u8
}

/// Linear rescale of the signed 16-bit stick range onto 0..=180
///
/// `-32768` (which evdev can report) is treated as `-32767`.
pub fn angle_from_axis(raw: i32) -> u8 {
    let raw = raw.clamp(AXIS_MIN, AXIS_MAX);
    let span = (AXIS_MAX - AXIS_MIN) as f64;
    let angle = ((raw - AXIS_MIN) as f64 / span * ANGLE_MAX as f64).round();
    clamp_angle(angle as i64)
}

/// Flip a stick reading so increasing deflection reads the other way
pub fn invert_axis(raw: i32) -> i32 {
    -raw.clamp(AXIS_MIN, AXIS_MAX)
}

/// Off-tick count for an angle, over a 0..=180 travel
pub fn pulse_from_angle(angle: i64, pulse_min: u16, pulse_max: u16) -> u16 {
    pulse_from_angle_range(angle, pulse_min, pulse_max, ANGLE_MAX as u16)
}

/// Off-tick count for an angle over an arbitrary angular travel
///
/// Integer arithmetic; `range == 0` yields `pulse_min`.
pub fn pulse_from_angle_range(angle: i64, pulse_min: u16, pulse_max: u16, range: u16) -> u16 {
    if range == 0 || pulse_max <= pulse_min {
        return pulse_min;
    }
    let angle = angle.clamp(0, range as i64);
    let span = (pulse_max - pulse_min) as i64;
    (pulse_min as i64 + angle * span / range as i64) as u16
}

/// Narrow (or widen) an angle around center by a speed factor
pub fn scale_about_center(angle: u8, speed: f32) -> u8 {
    let center = ANGLE_CENTER as f32;
    let scaled = center + (angle as f32 - center) * speed;
    clamp_angle(scaled.round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_endpoints() {
        assert_eq!(angle_from_axis(AXIS_MIN), 0);
        assert_eq!(angle_from_axis(0), 90);
        assert_eq!(angle_from_axis(AXIS_MAX), 180);
        assert_eq!(angle_from_axis(-32768), 0);
        assert_eq!(angle_from_axis(i32::MAX), 180);
    }

    #[test]
    fn test_axis_monotonic() {
        let mut last = angle_from_axis(AXIS_MIN);
        for raw in (AXIS_MIN..=AXIS_MAX).step_by(7) {
            let angle = angle_from_axis(raw);
            assert!(angle >= last, "angle dropped at raw {}", raw);
            assert!(angle <= ANGLE_MAX);
            last = angle;
        }
    }

    #[test]
    fn test_invert() {
        assert_eq!(angle_from_axis(invert_axis(AXIS_MAX)), 0);
        assert_eq!(angle_from_axis(invert_axis(-32768)), 180);
        assert_eq!(invert_axis(0), 0);
    }

    #[test]
    fn test_pulse_endpoints() {
        assert_eq!(pulse_from_angle(0, 150, 600), 150);
        assert_eq!(pulse_from_angle(90, 150, 600), 375);
        assert_eq!(pulse_from_angle(180, 150, 600), 600);
        assert_eq!(pulse_from_angle(-20, 150, 600), 150);
        assert_eq!(pulse_from_angle(500, 150, 600), 600);
    }

    #[test]
    fn test_pulse_monotonic() {
        let mut last = pulse_from_angle(0, 150, 600);
        for angle in 0..=180 {
            let pulse = pulse_from_angle(angle, 150, 600);
            assert!(pulse >= last);
            assert!((150..=600).contains(&pulse));
            last = pulse;
        }
    }

    #[test]
    fn test_pulse_custom_range() {
        assert_eq!(pulse_from_angle_range(270, 100, 500, 270), 500);
        assert_eq!(pulse_from_angle_range(10, 100, 500, 0), 100);
    }

    #[test]
    fn test_scale_about_center() {
        assert_eq!(scale_about_center(180, 1.0), 180);
        assert_eq!(scale_about_center(180, 0.5), 135);
        assert_eq!(scale_about_center(0, 0.5), 45);
        assert_eq!(scale_about_center(180, 2.0), 180);
        assert_eq!(scale_about_center(90, 0.1), 90);
    }
}

//! Shared unit helpers for wall_core.

/// Drive ratio of the rig: 150 RPM at the motor moves the wall surface
/// 1 m/min (1500 RPM = 10 m/min).
pub const RPM_PER_M_PER_MIN: i32 = 150;

/// Convert a motor setpoint to the belt speed shown to the climber.
#[inline]
pub fn rpm_to_m_per_min(rpm: i32) -> i32 {
    rpm / RPM_PER_M_PER_MIN
}

/// Clamp a setpoint to `[min, max]`, with an optional upper bound.
#[inline]
pub fn clamp_rpm(rpm: i32, min: i32, max: Option<i32>) -> i32 {
    let upper = match max {
        Some(m) => rpm.min(m),
        None => rpm,
    };
    upper.max(min)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn belt_speed_conversion() {
        assert_eq!(rpm_to_m_per_min(1500), 10);
        assert_eq!(rpm_to_m_per_min(2000), 13);
        assert_eq!(rpm_to_m_per_min(0), 0);
    }

    #[test]
    fn clamp_honors_optional_upper_bound() {
        assert_eq!(clamp_rpm(3500, 0, Some(3000)), 3000);
        assert_eq!(clamp_rpm(3500, 0, None), 3500);
        assert_eq!(clamp_rpm(-100, 0, Some(3000)), 0);
    }
}

//! Conversions between the raw sensor frame and the display frame.
//!
//! Viewers commonly show a LIDAR scan rotated by R_x(-90 deg) so that the sensor's
//! z-up frame appears y-up on screen: `display = R * raw`. The geometry pipeline
//! never sees that rotation, so a position picked on screen has to be brought back
//! to the raw frame before it is used to query the index.

/// Map a display frame position back to the raw frame.
///
/// Example:
///
/// ```
/// use cloudbox_3d::transforms::display_to_raw;
///
/// assert_eq!(display_to_raw(&[1.0, 2.0, 3.0]), [1.0, -3.0, 2.0]);
/// ```
pub fn display_to_raw(p: &[f32; 3]) -> [f32; 3] {
    [p[0], -p[2], p[1]]
}

/// Map a raw frame position to the display frame.
pub fn raw_to_display(p: &[f32; 3]) -> [f32; 3] {
    [p[0], p[2], -p[1]]
}

/// The display rotation as a row-major matrix.
pub const RAW_TO_DISPLAY: [[f32; 3]; 3] = [[1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, -1.0, 0.0]];

#[cfg(test)]
mod tests {
    use super::*;

    fn mul(m: &[[f32; 3]; 3], p: &[f32; 3]) -> [f32; 3] {
        std::array::from_fn(|r| m[r][0] * p[0] + m[r][1] * p[1] + m[r][2] * p[2])
    }

    #[test]
    fn test_roundtrip() {
        let p = [1.5, -2.0, 4.0];
        assert_eq!(display_to_raw(&raw_to_display(&p)), p);
        assert_eq!(raw_to_display(&display_to_raw(&p)), p);
    }

    #[test]
    fn test_matches_rotation_matrix() {
        let p = [0.25, 3.0, -7.0];
        assert_eq!(mul(&RAW_TO_DISPLAY, &p), raw_to_display(&p));
    }

    #[test]
    fn test_up_axis() {
        // the sensor's up axis points up on screen
        assert_eq!(raw_to_display(&[0.0, 0.0, 1.0]), [0.0, 1.0, 0.0]);
    }
}

use glam::{Mat3, Mat4, Vec3};

use crate::components::{Axis, Orientation};

/// Angle added per tick to every active rotation axis, in radians.
pub const ROTATION_STEP: f32 = 0.01;

/// Distance of the object from the eye along -z.
pub const EYE_DISTANCE: f32 = 3.0;

const FOV_Y_DEGREES: f32 = 45.0;
const Z_NEAR: f32 = 0.1;
const Z_FAR: f32 = 100.0;

pub fn advance_orientation(orientation: &mut Orientation) {
    for axis in Axis::ALL {
        if orientation.is_active(axis) {
            orientation.angles[axis as usize] += ROTATION_STEP;
        }
    }
}

/// translate(x, y, -3) · scale · [rotX] · [rotY] · [rotZ]
///
/// A rotation factor is included only while its axis is active, so a paused
/// axis drops out of the matrix but keeps its accumulated angle.
pub fn model_view(position: [f32; 2], scale: [f32; 3], orientation: &Orientation) -> Mat4 {
    let mut m = Mat4::from_translation(Vec3::new(position[0], position[1], -EYE_DISTANCE))
        * Mat4::from_scale(Vec3::from_array(scale));

    for axis in Axis::ALL {
        if !orientation.is_active(axis) {
            continue;
        }
        let angle = orientation.angle(axis);
        m *= match axis {
            Axis::X => Mat4::from_rotation_x(angle),
            Axis::Y => Mat4::from_rotation_y(angle),
            Axis::Z => Mat4::from_rotation_z(angle),
        };
    }

    m
}

/// Perspective projection with wgpu's [0, 1] depth range.
pub fn projection(width: u32, height: u32) -> Mat4 {
    let aspect = if height == 0 {
        1.0
    } else {
        width as f32 / height as f32
    };
    Mat4::perspective_rh(FOV_Y_DEGREES.to_radians(), aspect, Z_NEAR, Z_FAR)
}

/// Inverse-transpose of the upper 3x3, widened to a Mat4 for uniform layout.
pub fn normal_matrix(model_view: &Mat4) -> Mat4 {
    let upper = Mat3::from_mat4(*model_view);
    if upper.determinant().abs() < f32::EPSILON {
        return Mat4::IDENTITY;
    }
    Mat4::from_mat3(upper.inverse().transpose())
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-5
    }

    // ── orientation ───────────────────────────────────────────────────────

    #[test]
    fn only_active_axes_advance() {
        let mut o = Orientation::new();
        o.toggle(Axis::Z);
        advance_orientation(&mut o);
        advance_orientation(&mut o);
        assert_eq!(o.angles[0], 0.0);
        assert_eq!(o.angles[1], 0.0);
        assert!((o.angles[2] - 2.0 * ROTATION_STEP).abs() < 1e-7);
    }

    #[test]
    fn toggled_off_axis_keeps_angle() {
        let mut o = Orientation::new();
        o.toggle(Axis::X);
        advance_orientation(&mut o);
        o.toggle(Axis::X);
        advance_orientation(&mut o);
        assert!((o.angles[0] - ROTATION_STEP).abs() < 1e-7);
    }

    // ── model-view ────────────────────────────────────────────────────────

    #[test]
    fn model_view_translates_origin_in_front_of_eye() {
        let m = model_view([0.25, -0.5], [1.0, 1.0, 1.0], &Orientation::new());
        let p = m.transform_point3(Vec3::ZERO);
        assert!(approx(p, Vec3::new(0.25, -0.5, -EYE_DISTANCE)));
    }

    #[test]
    fn scale_applies_before_translation() {
        let m = model_view([1.0, 0.0], [2.0, 3.0, 4.0], &Orientation::new());
        let p = m.transform_point3(Vec3::ONE);
        assert!(approx(p, Vec3::new(3.0, 3.0, 4.0 - EYE_DISTANCE)));
    }

    #[test]
    fn inactive_axis_is_left_out() {
        let mut o = Orientation::new();
        o.angles = [1.0, 1.0, 1.0];
        let m = model_view([0.0, 0.0], [1.0; 3], &o);
        assert!(approx(m.transform_vector3(Vec3::X), Vec3::X));
    }

    #[test]
    fn rotations_compose_x_then_y_then_z() {
        let mut o = Orientation::new();
        o.angles = [0.3, 0.7, 1.1];
        o.active = [true, true, true];

        let m = model_view([0.0, 0.0], [1.0; 3], &o);
        let expected = Mat4::from_translation(Vec3::new(0.0, 0.0, -EYE_DISTANCE))
            * Mat4::from_rotation_x(0.3)
            * Mat4::from_rotation_y(0.7)
            * Mat4::from_rotation_z(1.1);
        assert!(m.abs_diff_eq(expected, 1e-6));
    }

    // ── projection ────────────────────────────────────────────────────────

    #[test]
    fn projection_maps_near_and_far_to_depth_range() {
        let p = projection(800, 600);
        let near = p * Vec4::new(0.0, 0.0, -Z_NEAR, 1.0);
        let far = p * Vec4::new(0.0, 0.0, -Z_FAR, 1.0);
        assert!((near.z / near.w).abs() < 1e-5);
        assert!((far.z / far.w - 1.0).abs() < 1e-5);
    }

    #[test]
    fn projection_tracks_aspect_ratio() {
        let wide = projection(1600, 800);
        let square = projection(800, 800);
        assert!((square.x_axis.x / wide.x_axis.x - 2.0).abs() < 1e-5);
    }

    #[test]
    fn projection_zero_height_is_square() {
        assert!(projection(640, 0).abs_diff_eq(projection(10, 10), 1e-6));
    }

    // ── normals ───────────────────────────────────────────────────────────

    #[test]
    fn normal_matrix_undoes_nonuniform_scale() {
        let m = model_view([0.0, 0.0], [2.0, 1.0, 1.0], &Orientation::new());
        let n = normal_matrix(&m).transform_vector3(Vec3::X);
        assert!(approx(n, Vec3::new(0.5, 0.0, 0.0)));
    }
}

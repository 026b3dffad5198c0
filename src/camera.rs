//! Chase camera that trails the player from above.

use glam::{Mat4, Vec3};

use crate::constants::{
    CAMERA_ASPECT, CAMERA_FAR, CAMERA_FOV_DEGREES, CAMERA_HEIGHT, CAMERA_NEAR, CAMERA_PITCH,
    CAMERA_TRAIL,
};
use crate::types::{CameraView, WorldPoint};

/// Unit vector the camera looks along.
pub fn forward() -> Vec3 {
    let (sin_pitch, cos_pitch) = CAMERA_PITCH.sin_cos();
    Vec3::new(0.0, sin_pitch, cos_pitch)
}

pub fn right() -> Vec3 {
    Vec3::NEG_X
}

pub fn up() -> Vec3 {
    right().cross(forward())
}

/// Eye position for a player standing at `player`. The renderer mirrors x.
pub fn eye_for(player: WorldPoint) -> Vec3 {
    Vec3::new(
        -(player.x as f32),
        CAMERA_HEIGHT,
        player.z as f32 - CAMERA_TRAIL,
    )
}

pub fn view_matrix(player: WorldPoint) -> Mat4 {
    let eye = eye_for(player);
    Mat4::look_at_rh(eye, eye + forward(), up())
}

pub fn projection_matrix() -> Mat4 {
    Mat4::perspective_rh_gl(
        CAMERA_FOV_DEGREES.to_radians(),
        CAMERA_ASPECT,
        CAMERA_NEAR,
        CAMERA_FAR,
    )
}

pub fn camera_for(player: WorldPoint) -> CameraView {
    CameraView {
        eye: eye_for(player).to_array(),
        view: view_matrix(player).to_cols_array_2d(),
        projection: projection_matrix().to_cols_array_2d(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn camera_basis_is_orthonormal() {
        assert!((forward().length() - 1.0).abs() < 1e-5);
        assert!(forward().dot(right()).abs() < 1e-5);
        assert!(up().dot(forward()).abs() < 1e-5);
        assert!(up().y > 0.0, "camera must not be upside down");
        assert!(forward().y < 0.0, "camera looks down at the floor");
    }

    #[test]
    fn eye_trails_the_player() {
        let eye = eye_for(WorldPoint { x: -8, z: 0 });
        assert!(approx(eye, Vec3::new(8.0, 25.0, -20.0)));
    }

    #[test]
    fn view_maps_eye_to_origin() {
        let player = WorldPoint { x: 4, z: -6 };
        let view = view_matrix(player);
        let at_eye = view.transform_point3(eye_for(player));
        assert!(approx(at_eye, Vec3::ZERO));
        // Points ahead of the camera land on the negative z axis in view space.
        let ahead = view.transform_point3(eye_for(player) + forward() * 5.0);
        assert!(approx(ahead, Vec3::new(0.0, 0.0, -5.0)));
    }

    #[test]
    fn snapshot_view_moves_with_the_player() {
        let a = camera_for(WorldPoint { x: 0, z: 0 });
        let b = camera_for(WorldPoint { x: 2, z: 0 });
        assert_ne!(a.view, b.view);
        assert_eq!(a.projection, b.projection);
        assert_eq!(b.eye, [-2.0, 25.0, -20.0]);
    }
}

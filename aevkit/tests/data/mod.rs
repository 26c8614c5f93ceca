#![allow(dead_code)]

use aevkit::{AtomicSystem, Matrix3, UnitCell, Vector3D};

pub const PARAMETERS: &str = r#"{
    "radial": {"cutoff": 5.2, "head": 0.9, "tail": 5.2, "step": 0.5, "sigma": 0.25},
    "angular": {"cutoff": 3.5, "head": 0.9, "tail": 3.5, "step": 0.65, "sigma": 0.5, "zeta": 8.0, "ndiv": 4}
}"#;

// species
pub const H: usize = 0;
pub const C: usize = 1;
pub const O: usize = 2;

/// Water molecule without periodic boundary conditions
pub fn water() -> AtomicSystem {
    let mut system = AtomicSystem::new(UnitCell::infinite());
    system.add_atom(O, Vector3D::new(0.0, 0.0, 0.0));
    system.add_atom(H, Vector3D::new(0.0, 0.75545, -0.58895));
    system.add_atom(H, Vector3D::new(0.0, -0.75545, -0.58895));
    return system;
}

/// Methanol in a small triclinic box, interacting with its periodic images
pub fn methanol() -> AtomicSystem {
    let cell = Matrix3::new([[4.5, 0.0, 0.0], [0.8, 4.2, 0.0], [-0.3, 0.5, 4.8]]);
    let mut system = AtomicSystem::new(UnitCell::try_from(cell).expect("invalid cell"));
    system.add_atom(C, Vector3D::new(-0.046, 0.663, 0.0));
    system.add_atom(O, Vector3D::new(-0.046, -0.754, 0.0));
    system.add_atom(H, Vector3D::new(-1.086, 0.975, 0.0));
    system.add_atom(H, Vector3D::new(0.437, 1.070, 0.888));
    system.add_atom(H, Vector3D::new(0.437, 1.070, -0.888));
    system.add_atom(H, Vector3D::new(0.845, -1.086, 0.0));
    return system;
}

/// Two CO2 molecules in a cubic box
pub fn carbon_dioxide() -> AtomicSystem {
    let mut system = AtomicSystem::new(UnitCell::cubic(6.5).expect("invalid cell"));
    system.add_atom(C, Vector3D::new(1.0, 1.0, 1.0));
    system.add_atom(O, Vector3D::new(2.16, 1.0, 1.0));
    system.add_atom(O, Vector3D::new(-0.16, 1.0, 1.0));
    system.add_atom(C, Vector3D::new(4.0, 3.5, 3.2));
    system.add_atom(O, Vector3D::new(4.0, 4.66, 3.2));
    system.add_atom(O, Vector3D::new(4.0, 2.34, 3.2));
    return system;
}

/// Diamond carbon in the primitive FCC cell
pub fn diamond() -> AtomicSystem {
    let a = 3.567 / 2.0;
    let cell = Matrix3::new([[0.0, a, a], [a, 0.0, a], [a, a, 0.0]]);
    let mut system = AtomicSystem::new(UnitCell::try_from(cell).expect("invalid cell"));
    system.add_atom(C, Vector3D::new(0.0, 0.0, 0.0));
    system.add_atom(C, Vector3D::new(0.5 * a, 0.5 * a, 0.5 * a));
    return system;
}

pub fn all_systems() -> Vec<AtomicSystem> {
    return vec![water(), methanol(), carbon_dioxide(), diamond()];
}

/// Rotation matrix of `angle` (in radians) around `axis`
pub fn rotation(axis: Vector3D, angle: f64) -> Matrix3 {
    let axis = axis.normalized();
    let (x, y, z) = (axis[0], axis[1], axis[2]);
    let (sin, cos) = f64::sin_cos(angle);
    let t = 1.0 - cos;

    return Matrix3::new([
        [t * x * x + cos,     t * x * y - sin * z, t * x * z + sin * y],
        [t * x * y + sin * z, t * y * y + cos,     t * y * z - sin * x],
        [t * x * z - sin * y, t * y * z + sin * x, t * z * z + cos],
    ]);
}

use crate::{Matrix3, Vector3D};
use super::{AtomicSystem, UnitCell};

// species used by the molecular test systems
pub const H: usize = 0;
pub const C: usize = 1;
pub const O: usize = 2;

pub fn test_systems(names: &[&str]) -> Vec<AtomicSystem> {
    return names.iter().map(|&name| test_system(name)).collect();
}

pub fn test_system(name: &str) -> AtomicSystem {
    match name {
        "methane" => get_methane(),
        "water" => get_water(),
        "CH" => get_ch(),
        "NaCl" => get_nacl(),
        _ => panic!("unknown test system {}", name)
    }
}

fn get_methane() -> AtomicSystem {
    let mut system = AtomicSystem::new(UnitCell::cubic(5.0).unwrap());
    system.add_atom(C, Vector3D::new(5.0000, 5.0000, 5.0000));
    system.add_atom(H, Vector3D::new(5.5288, 5.1610, 5.9359));
    system.add_atom(H, Vector3D::new(5.2051, 5.8240, 4.3214));
    system.add_atom(H, Vector3D::new(5.3345, 4.0686, 4.5504));
    system.add_atom(H, Vector3D::new(3.9315, 4.9463, 5.1921));
    return system;
}

fn get_water() -> AtomicSystem {
    let mut system = AtomicSystem::new(UnitCell::cubic(10.0).unwrap());
    system.add_atom(O, Vector3D::new(0.0, 0.0, 0.0));
    system.add_atom(H, Vector3D::new(0.0, 0.75545, -0.58895));
    system.add_atom(H, Vector3D::new(0.0, -0.75545, -0.58895));
    return system;
}

/// Non periodic CH molecule
fn get_ch() -> AtomicSystem {
    let mut system = AtomicSystem::new(UnitCell::infinite());
    system.add_atom(C, Vector3D::new(0.0, 0.0, 0.0));
    system.add_atom(H, Vector3D::new(0.0, 1.2, 0.0));
    return system;
}

/// NaCl structure, using a primitive unit cell. The distance between the
/// closest Na-Cl pair is exactly 1. Na is species 0 and Cl species 1.
fn get_nacl() -> AtomicSystem {
    let cell = Matrix3::new([[0.0, 1.0, 1.0], [1.0, 0.0, 1.0], [1.0, 1.0, 0.0]]);
    let mut system = AtomicSystem::new(UnitCell::try_from(cell).unwrap());
    system.add_atom(0, Vector3D::new(0.0, 0.0, 0.0));
    system.add_atom(1, Vector3D::new(1.0, 0.0, 0.0));
    return system;
}

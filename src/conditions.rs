use nalgebra::Vector3;
use rodrelax::{point, Beam, Boundary, ConfigurationError, Frame, Load, Material, Section, Support};

/// Physical properties used for the cantilever demonstration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CantileverProperties {
    /// Length of the rod in metres.
    pub length: f64,
    /// Number of handle sections along the rod.
    pub handles: usize,
    /// Axial stiffness `E·A` in newtons.
    pub axial_stiffness: f64,
    /// Bending stiffness `E·I` in newton square metres.
    pub bending_stiffness: f64,
    /// Transverse load in newtons applied at the free end.
    pub tip_load: f64,
}

impl Default for CantileverProperties {
    fn default() -> Self {
        Self {
            length: 1.0,
            handles: 5,
            axial_stiffness: 100.0,
            bending_stiffness: 1.0,
            tip_load: 1.0e-3,
        }
    }
}

/// Physical properties used for the twist demonstration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TwistProperties {
    /// Length of the rod in metres.
    pub length: f64,
    /// Number of handle sections along the rod.
    pub handles: usize,
    /// Torsional stiffness `G·J` in newton square metres.
    pub torsional_stiffness: f64,
    /// Rotation imposed on the far end about the rod axis, in radians.
    pub angle: f64,
}

impl Default for TwistProperties {
    fn default() -> Self {
        Self {
            length: 1.0,
            handles: 5,
            torsional_stiffness: 1.0,
            angle: 0.5,
        }
    }
}

/// Straight rod along the global X axis, one frame per handle.
fn straight_frames(length: f64, handles: usize) -> Vec<Frame> {
    let step = length / (handles.max(2) - 1) as f64;
    (0..handles.max(2))
        .map(|k| Frame::along_x(point(k as f64 * step, 0.0, 0.0)))
        .collect()
}

/// Build a rod clamped at its start and loaded transversally at its end.
///
/// For small loads the tip deflection approaches the Euler-Bernoulli value
/// `F·L³ / (3·E·I)` (see <https://en.wikipedia.org/wiki/Euler%E2%80%93Bernoulli_beam_theory>).
pub fn build_cantilever(
    properties: &CantileverProperties,
) -> Result<(Vec<Beam>, Vec<Support>), ConfigurationError> {
    let frames = straight_frames(properties.length, properties.handles);
    // Unit Young's modulus: the section carries the stiffnesses directly.
    let section = Section::new(
        properties.axial_stiffness,
        properties.bending_stiffness,
        properties.bending_stiffness,
        0.0,
    )
    .map_err(|source| ConfigurationError::InvalidSection { segment: 0, source })?;
    let material = Material::new(1.0, 0.0)
        .map_err(|source| ConfigurationError::InvalidSection { segment: 0, source })?;
    let mut beam = Beam::new(&frames, &frames, &[section], &[material])?;

    // The load pushes the free end downwards along -Z.
    beam.load(vec![Load::force(
        frames.len() - 1,
        Vector3::new(0.0, 0.0, -properties.tip_load),
    )])?;

    Ok((vec![beam], vec![Support::clamped(0, Boundary::Start)]))
}

/// Build a rod clamped at both ends, with the far end turned about the rod axis.
///
/// The twist spreads uniformly, so every section carries the torque
/// `G·J·φ / L` (see <https://en.wikipedia.org/wiki/Torsion_(mechanics)>).
pub fn build_twist(
    properties: &TwistProperties,
) -> Result<(Vec<Beam>, Vec<Support>), ConfigurationError> {
    let frames = straight_frames(properties.length, properties.handles);
    let section = Section::new(1.0, 1.0, 1.0, properties.torsional_stiffness)
        .map_err(|source| ConfigurationError::InvalidSection { segment: 0, source })?;
    let material = Material::new(1.0, 1.0)
        .map_err(|source| ConfigurationError::InvalidSection { segment: 0, source })?;
    let beam = Beam::new(&frames, &frames, &[section], &[material])?;

    // The far clamp spins its section to the turned reference frame when the
    // solver initializes; the near clamp keeps the section as built.
    let turned = frames[frames.len() - 1].rotated_about_tangent(properties.angle);
    let supports = vec![
        Support::clamped(0, Boundary::Start),
        Support::clamped_with_frame(0, Boundary::End, turned),
    ];
    Ok((vec![beam], supports))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cantilever_has_one_clamp_and_a_tip_load() {
        let (beams, supports) =
            build_cantilever(&CantileverProperties::default()).expect("valid setup");
        assert_eq!(beams.len(), 1);
        assert_eq!(beams[0].topology().handle_count(), 5);
        assert_eq!(beams[0].loads().len(), 1);
        assert_eq!(supports, vec![Support::clamped(0, Boundary::Start)]);
        assert!(!beams[0].is_torsion_capable());
    }

    #[test]
    fn twist_clamps_both_ends() {
        let (beams, supports) = build_twist(&TwistProperties::default()).expect("valid setup");
        assert!(beams[0].is_torsion_capable());
        assert_eq!(supports.len(), 2);
        assert_eq!(supports[1].boundary(), Boundary::End);
    }

    #[test]
    fn invalid_stiffness_is_reported() {
        let properties = CantileverProperties {
            axial_stiffness: 0.0,
            ..CantileverProperties::default()
        };
        assert!(matches!(
            build_cantilever(&properties),
            Err(ConfigurationError::InvalidSection { .. })
        ));
    }
}

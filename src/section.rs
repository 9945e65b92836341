//! Cross-section and material properties combined into per-edge stiffness.

use serde::{Deserialize, Serialize};

use crate::errors::SectionError;

/// Geometric properties of a cross-section.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Area in square metres.
    pub area: f64,
    /// Second moment of area about `d1` in metres to the fourth.
    pub i1: f64,
    /// Second moment of area about `d2` in metres to the fourth.
    pub i2: f64,
    /// Torsional constant in metres to the fourth.
    pub j: f64,
}

impl Section {
    /// Create a section from explicit properties.
    ///
    /// # Errors
    ///
    /// Returns [`SectionError`] when the area is not strictly positive or an
    /// inertia is negative.
    pub fn new(area: f64, i1: f64, i2: f64, j: f64) -> Result<Self, SectionError> {
        if !(area > 0.0 && area.is_finite()) {
            return Err(SectionError::NonPositiveArea { area });
        }
        for inertia in [i1, i2, j] {
            if !(inertia >= 0.0 && inertia.is_finite()) {
                return Err(SectionError::InvalidInertia { inertia });
            }
        }
        Ok(Self { area, i1, i2, j })
    }

    /// Solid circular section.
    ///
    /// # Errors
    ///
    /// Returns [`SectionError::NonPositiveArea`] for a non-positive radius.
    ///
    /// # Examples
    /// ```
    /// use rodrelax::Section;
    ///
    /// let section = Section::circular(0.01).expect("valid radius");
    /// assert!((section.j - 2.0 * section.i1).abs() < 1.0e-20);
    /// ```
    pub fn circular(radius: f64) -> Result<Self, SectionError> {
        let area = std::f64::consts::PI * radius * radius;
        let i = std::f64::consts::PI * radius.powi(4) / 4.0;
        Self::new(area, i, i, 2.0 * i)
    }

    /// Hollow circular section.
    ///
    /// # Errors
    ///
    /// Returns [`SectionError::NonPositiveArea`] when the wall is empty.
    pub fn tube(outer_radius: f64, thickness: f64) -> Result<Self, SectionError> {
        let inner = (outer_radius - thickness).max(0.0);
        let area = std::f64::consts::PI * (outer_radius.powi(2) - inner.powi(2));
        let i = std::f64::consts::PI * (outer_radius.powi(4) - inner.powi(4)) / 4.0;
        Self::new(area, i, i, 2.0 * i)
    }

    /// Solid rectangular section of width `b` (along `d1`) and height `h` (along `d2`).
    ///
    /// The torsional constant uses the thin-rectangle series approximation.
    ///
    /// # Errors
    ///
    /// Returns [`SectionError::NonPositiveArea`] for a non-positive side.
    pub fn rectangular(b: f64, h: f64) -> Result<Self, SectionError> {
        if !(b > 0.0 && h > 0.0) {
            return Err(SectionError::NonPositiveArea { area: b * h });
        }
        let (long, short) = if b >= h { (b, h) } else { (h, b) };
        let j = long * short.powi(3) * (1.0 / 3.0 - 0.21 * short / long * (1.0 - short.powi(4) / (12.0 * long.powi(4))));
        Self::new(b * h, b * h.powi(3) / 12.0, h * b.powi(3) / 12.0, j)
    }
}

/// Linear elastic isotropic material.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Young's modulus in pascals.
    pub young_modulus: f64,
    /// Shear modulus in pascals.
    pub shear_modulus: f64,
}

impl Material {
    /// Create a material from Young's and shear moduli.
    ///
    /// # Errors
    ///
    /// Returns [`SectionError`] when `young_modulus` is not strictly positive or
    /// `shear_modulus` is negative.
    pub fn new(young_modulus: f64, shear_modulus: f64) -> Result<Self, SectionError> {
        if !(young_modulus > 0.0 && young_modulus.is_finite()) {
            return Err(SectionError::NonPositiveYoungModulus { young_modulus });
        }
        if !(shear_modulus >= 0.0 && shear_modulus.is_finite()) {
            return Err(SectionError::InvalidShearModulus { shear_modulus });
        }
        Ok(Self {
            young_modulus,
            shear_modulus,
        })
    }

    /// Create a material from Young's modulus and Poisson's ratio, `G = E / (2(1 + ν))`.
    ///
    /// # Errors
    ///
    /// See [`Material::new`].
    pub fn from_poisson(young_modulus: f64, poisson_ratio: f64) -> Result<Self, SectionError> {
        Self::new(young_modulus, young_modulus / (2.0 * (1.0 + poisson_ratio)))
    }
}

/// Stiffness of one edge: axial, two bending and torsional.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Stiffness {
    /// Axial stiffness `E·A`.
    pub ea: f64,
    /// Bending stiffness about `d1`.
    pub ei1: f64,
    /// Bending stiffness about `d2`.
    pub ei2: f64,
    /// Torsional stiffness `G·J`.
    pub gj: f64,
}

impl Stiffness {
    /// Combine a section with a material.
    #[must_use]
    pub fn new(section: &Section, material: &Material) -> Self {
        Self {
            ea: material.young_modulus * section.area,
            ei1: material.young_modulus * section.i1,
            ei2: material.young_modulus * section.i2,
            gj: material.shear_modulus * section.j,
        }
    }

    /// Larger of the two bending stiffnesses.
    #[must_use]
    pub fn ei_max(&self) -> f64 {
        self.ei1.max(self.ei2)
    }
}

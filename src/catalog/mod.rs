//! Registry of the biochemical quantity kinds handled by the balancer.
//!
//! Fourteen kinds are modeled. Seven are *basic* and span the independent
//! parameter basis; seven are *derived* and follow deterministically from the
//! basic ones through thermodynamic identities (Haldane and Wegscheider
//! relations, detailed balance).
//!
//! References:
//! - Liebermeister W, Klipp E. Theor Biol Med Model. 2006;3:41
//! - Lubitz T et al. J Phys Chem B. 2010;114:16298-16303

mod recipes;

pub use recipes::{Recipe, RecipeSlot, StoichVariant};

/// Gas constant in kJ/(mol·K).
pub const GAS_CONSTANT_KJ_PER_MOL_K: f64 = 0.008314462;

/// Reciprocal of RT at the 298.15 K reference temperature, in mol/kJ.
///
/// Frozen at this exact value for reproducibility of derived quantities.
pub const RT_INV: f64 = 1.0 / 2.4790;

/// Scale on which a quantity is modeled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scale {
    /// Modeled directly on the natural scale (thermodynamic potentials).
    Additive,
    /// Modeled on the natural log scale (lognormal variates).
    Multiplicative,
}

/// Biological element a quantity attaches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attachment {
    Species,
    Reaction,
    ReactionSpecies,
}

/// Whether a kind contributes a basis column or a derived row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Basic,
    Derived,
}

/// The closed set of modeled quantity kinds, in global order.
///
/// The discriminant order is load-bearing: basis columns, dependency-matrix
/// rows and output rows are all materialized in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum QuantityKind {
    StandardChemicalPotential,
    CatalyticRateGeometricMean,
    MichaelisConstant,
    ActivationConstant,
    InhibitoryConstant,
    EnzymeConcentration,
    Concentration,
    EquilibriumConstant,
    SubstrateCatalyticRate,
    ProductCatalyticRate,
    ForwardMaximalVelocity,
    ReverseMaximalVelocity,
    ChemicalPotential,
    ReactionAffinity,
}

impl QuantityKind {
    /// All kinds in global order.
    pub const ALL: [QuantityKind; 14] = [
        QuantityKind::StandardChemicalPotential,
        QuantityKind::CatalyticRateGeometricMean,
        QuantityKind::MichaelisConstant,
        QuantityKind::ActivationConstant,
        QuantityKind::InhibitoryConstant,
        QuantityKind::EnzymeConcentration,
        QuantityKind::Concentration,
        QuantityKind::EquilibriumConstant,
        QuantityKind::SubstrateCatalyticRate,
        QuantityKind::ProductCatalyticRate,
        QuantityKind::ForwardMaximalVelocity,
        QuantityKind::ReverseMaximalVelocity,
        QuantityKind::ChemicalPotential,
        QuantityKind::ReactionAffinity,
    ];

    /// The seven basic kinds in global order.
    pub const BASIC: [QuantityKind; 7] = [
        QuantityKind::StandardChemicalPotential,
        QuantityKind::CatalyticRateGeometricMean,
        QuantityKind::MichaelisConstant,
        QuantityKind::ActivationConstant,
        QuantityKind::InhibitoryConstant,
        QuantityKind::EnzymeConcentration,
        QuantityKind::Concentration,
    ];

    /// The seven derived kinds in global order.
    pub const DERIVED: [QuantityKind; 7] = [
        QuantityKind::EquilibriumConstant,
        QuantityKind::SubstrateCatalyticRate,
        QuantityKind::ProductCatalyticRate,
        QuantityKind::ForwardMaximalVelocity,
        QuantityKind::ReverseMaximalVelocity,
        QuantityKind::ChemicalPotential,
        QuantityKind::ReactionAffinity,
    ];

    /// Stable string identifier used in tables and logs.
    pub fn name(&self) -> &'static str {
        match self {
            QuantityKind::StandardChemicalPotential => "standard chemical potential",
            QuantityKind::CatalyticRateGeometricMean => "catalytic rate constant geometric mean",
            QuantityKind::MichaelisConstant => "Michaelis constant",
            QuantityKind::ActivationConstant => "activation constant",
            QuantityKind::InhibitoryConstant => "inhibitory constant",
            QuantityKind::EnzymeConcentration => "concentration of enzyme",
            QuantityKind::Concentration => "concentration",
            QuantityKind::EquilibriumConstant => "equilibrium constant",
            QuantityKind::SubstrateCatalyticRate => "substrate catalytic rate constant",
            QuantityKind::ProductCatalyticRate => "product catalytic rate constant",
            QuantityKind::ForwardMaximalVelocity => "forward maximal velocity",
            QuantityKind::ReverseMaximalVelocity => "reverse maximal velocity",
            QuantityKind::ChemicalPotential => "chemical potential",
            QuantityKind::ReactionAffinity => "reaction affinity",
        }
    }

    /// Parse a stable string identifier back into a kind.
    pub fn from_name(name: &str) -> Option<QuantityKind> {
        QuantityKind::ALL.iter().copied().find(|k| k.name() == name)
    }
}

/// Immutable description of one quantity kind.
#[derive(Debug, Clone)]
pub struct KindSpec {
    pub kind: QuantityKind,
    pub unit: &'static str,
    pub scale: Scale,
    pub attachment: Attachment,
    pub role: Role,
    /// Prior median; geometric interpretation for multiplicative kinds.
    pub prior_median: f64,
    /// Prior spread; geometric standard deviation for multiplicative kinds,
    /// plain standard deviation for additive ones.
    pub prior_std: f64,
    /// Standard deviation substituted when an observation omits its own.
    pub default_data_std: f64,
    /// Canonical plausibility range on the natural scale.
    pub lower: f64,
    pub upper: f64,
}

/// Fixed registry of the 14 quantity kinds and their derived-kind recipes.
///
/// RT is evaluated at the configured temperature and only enters the recipes
/// that couple to current chemical potentials; the couplings through standard
/// chemical potentials use the frozen [`RT_INV`] reference value.
#[derive(Debug, Clone)]
pub struct QuantityCatalog {
    specs: Vec<KindSpec>,
    rt_kj_per_mol: f64,
}

impl QuantityCatalog {
    /// Build the catalog for a given temperature in Kelvin.
    pub fn new(temperature_k: f64) -> Self {
        Self {
            specs: default_specs(),
            rt_kj_per_mol: GAS_CONSTANT_KJ_PER_MOL_K * temperature_k,
        }
    }

    /// RT at the configured temperature, in kJ/mol.
    pub fn rt(&self) -> f64 {
        self.rt_kj_per_mol
    }

    /// All kind specs in global order.
    pub fn kinds(&self) -> &[KindSpec] {
        &self.specs
    }

    /// Spec for one kind.
    pub fn spec(&self, kind: QuantityKind) -> &KindSpec {
        &self.specs[kind as usize]
    }

    pub fn is_basic(&self, kind: QuantityKind) -> bool {
        self.spec(kind).role == Role::Basic
    }

    pub fn is_multiplicative(&self, kind: QuantityKind) -> bool {
        self.spec(kind).scale == Scale::Multiplicative
    }

    pub fn attachment(&self, kind: QuantityKind) -> Attachment {
        self.spec(kind).attachment
    }

    pub fn unit(&self, kind: QuantityKind) -> &'static str {
        self.spec(kind).unit
    }

    /// Prior (median, spread) for one kind, interpreted per its scale.
    pub fn prior(&self, kind: QuantityKind) -> (f64, f64) {
        let spec = self.spec(kind);
        (spec.prior_median, spec.prior_std)
    }

    pub fn default_data_std(&self, kind: QuantityKind) -> f64 {
        self.spec(kind).default_data_std
    }

    /// Canonical (lower, upper) plausibility range on the natural scale.
    pub fn bounds(&self, kind: QuantityKind) -> (f64, f64) {
        let spec = self.spec(kind);
        (spec.lower, spec.upper)
    }

    /// Override the prior of one kind (from a user-supplied prior table).
    pub fn set_prior(&mut self, kind: QuantityKind, median: f64, std: f64) {
        let spec = &mut self.specs[kind as usize];
        spec.prior_median = median;
        spec.prior_std = std;
    }

    /// Dependency recipe for a derived kind; `None` for basic kinds.
    pub fn recipe(&self, kind: QuantityKind) -> Option<Recipe> {
        recipes::recipe_for(kind, self.rt_kj_per_mol)
    }
}

/// Frozen default specs, one per kind in global order.
fn default_specs() -> Vec<KindSpec> {
    use Attachment::*;
    use QuantityKind::*;
    use Role::*;
    use Scale::*;

    vec![
        KindSpec {
            kind: StandardChemicalPotential,
            unit: "kJ/mol",
            scale: Additive,
            attachment: Species,
            role: Basic,
            prior_median: -880.0,
            prior_std: 680.0,
            default_data_std: 10.0,
            lower: -3000.0,
            upper: 3000.0,
        },
        KindSpec {
            kind: CatalyticRateGeometricMean,
            unit: "1/s",
            scale: Multiplicative,
            attachment: Reaction,
            role: Basic,
            prior_median: 10.0,
            prior_std: 1.0,
            default_data_std: 10.0,
            lower: 1e-5,
            upper: 1e6,
        },
        KindSpec {
            kind: MichaelisConstant,
            unit: "mM",
            scale: Multiplicative,
            attachment: ReactionSpecies,
            role: Basic,
            prior_median: 0.1,
            prior_std: 1.0,
            default_data_std: 0.1,
            lower: 1e-9,
            upper: 1e3,
        },
        KindSpec {
            kind: ActivationConstant,
            unit: "mM",
            scale: Multiplicative,
            attachment: ReactionSpecies,
            role: Basic,
            prior_median: 0.1,
            prior_std: 1.0,
            default_data_std: 0.1,
            lower: 1e-9,
            upper: 1e3,
        },
        KindSpec {
            kind: InhibitoryConstant,
            unit: "mM",
            scale: Multiplicative,
            attachment: ReactionSpecies,
            role: Basic,
            prior_median: 0.1,
            prior_std: 1.0,
            default_data_std: 0.1,
            lower: 1e-9,
            upper: 1e3,
        },
        KindSpec {
            kind: EnzymeConcentration,
            unit: "mM",
            scale: Multiplicative,
            attachment: Reaction,
            role: Basic,
            prior_median: 1e-5,
            prior_std: 1.5,
            default_data_std: 1e-5,
            lower: 1e-9,
            upper: 10.0,
        },
        KindSpec {
            kind: Concentration,
            unit: "mM",
            scale: Multiplicative,
            attachment: Species,
            role: Basic,
            prior_median: 0.1,
            prior_std: 1.5,
            default_data_std: 0.1,
            lower: 1e-9,
            upper: 1e3,
        },
        KindSpec {
            kind: EquilibriumConstant,
            unit: "dimensionless",
            scale: Multiplicative,
            attachment: Reaction,
            role: Derived,
            prior_median: 1.0,
            prior_std: 1.5,
            default_data_std: 1.0,
            lower: 1e-10,
            upper: 1e10,
        },
        KindSpec {
            kind: SubstrateCatalyticRate,
            unit: "1/s",
            scale: Multiplicative,
            attachment: Reaction,
            role: Derived,
            prior_median: 10.0,
            prior_std: 1.5,
            default_data_std: 10.0,
            lower: 1e-5,
            upper: 1e6,
        },
        KindSpec {
            kind: ProductCatalyticRate,
            unit: "1/s",
            scale: Multiplicative,
            attachment: Reaction,
            role: Derived,
            prior_median: 10.0,
            prior_std: 1.5,
            default_data_std: 10.0,
            lower: 1e-5,
            upper: 1e6,
        },
        KindSpec {
            kind: ForwardMaximalVelocity,
            unit: "mM/s",
            scale: Multiplicative,
            attachment: Reaction,
            role: Derived,
            prior_median: 1e-3,
            prior_std: 2.0,
            default_data_std: 1e-3,
            lower: 1e-9,
            upper: 1e3,
        },
        KindSpec {
            kind: ReverseMaximalVelocity,
            unit: "mM/s",
            scale: Multiplicative,
            attachment: Reaction,
            role: Derived,
            prior_median: 1e-3,
            prior_std: 2.0,
            default_data_std: 1e-3,
            lower: 1e-9,
            upper: 1e3,
        },
        KindSpec {
            kind: ChemicalPotential,
            unit: "kJ/mol",
            scale: Additive,
            attachment: Species,
            role: Derived,
            prior_median: -880.0,
            prior_std: 680.0,
            default_data_std: 10.0,
            lower: -3000.0,
            upper: 3000.0,
        },
        KindSpec {
            kind: ReactionAffinity,
            unit: "kJ/mol",
            scale: Additive,
            attachment: Reaction,
            role: Derived,
            prior_median: 0.0,
            prior_std: 10.0,
            default_data_std: 5.0,
            lower: -100.0,
            upper: 100.0,
        },
    ]
}

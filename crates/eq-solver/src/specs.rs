//! Equilibrium specifications: declared inputs, extra unknowns and
//! auxiliary equality constraints.
//!
//! By default temperature and pressure are inputs and the only unknowns are
//! the species amounts. Every other input comes with one constraint, and
//! every extra unknown (temperature or pressure not declared as input, or a
//! titrant amount) must be closed by one constraint.

use crate::error::{SolverError, SolverResult};
use eq_chem::{ChemicalFormula, ChemicalProps, ChemicalSystem, SpeciesRef};
use eq_core::Quantity;
use eq_core::units::constants::R_J_PER_MOL_K;
use nalgebra::DVector;
use std::fmt;
use std::sync::Arc;

/// Name of the temperature input.
pub const TEMPERATURE: &str = "T";
/// Name of the pressure input.
pub const PRESSURE: &str = "P";
/// Name of the pH input.
pub const PH: &str = "pH";

/// A declared scalar input.
#[derive(Debug, Clone, PartialEq)]
pub struct Input {
    pub name: String,
    pub quantity: Quantity,
}

/// Everything an auxiliary constraint may depend on.
pub struct ConstraintArgs<'a> {
    /// Temperature [K].
    pub t: f64,
    /// Pressure [Pa].
    pub p: f64,
    /// Species amounts [mol].
    pub n: &'a DVector<f64>,
    /// Chemical properties at (t, p, n).
    pub props: &'a ChemicalProps,
    /// Titrant amounts [mol], in the order they were opened.
    pub titrants: &'a [f64],
    inputs: &'a [Input],
    values: &'a [f64],
}

impl<'a> ConstraintArgs<'a> {
    pub(crate) fn new(
        t: f64,
        p: f64,
        n: &'a DVector<f64>,
        props: &'a ChemicalProps,
        titrants: &'a [f64],
        inputs: &'a [Input],
        values: &'a [f64],
    ) -> Self {
        Self {
            t,
            p,
            n,
            props,
            titrants,
            inputs,
            values,
        }
    }

    /// Value of a declared input (SI units).
    pub fn input(&self, name: &str) -> Option<f64> {
        self.inputs
            .iter()
            .position(|i| i.name == name)
            .and_then(|k| self.values.get(k).copied())
    }

    fn input_or_nan(&self, name: &str) -> f64 {
        self.input(name).unwrap_or(f64::NAN)
    }

    /// RT [J/mol].
    pub fn rt(&self) -> f64 {
        R_J_PER_MOL_K * self.t
    }
}

type ConstraintFn = dyn Fn(&ConstraintArgs<'_>) -> f64 + Send + Sync;
type GradientFn = dyn Fn(&ConstraintArgs<'_>) -> DVector<f64> + Send + Sync;

/// Named residual function that must vanish at equilibrium.
///
/// An optional amount gradient (∂v/∂n over every species) replaces finite
/// differences in the species columns of the Newton matrix. Dependence on
/// temperature, pressure and titrants is always differenced.
#[derive(Clone)]
pub struct EquationConstraint {
    pub name: String,
    f: Arc<ConstraintFn>,
    gradient: Option<Arc<GradientFn>>,
}

impl EquationConstraint {
    pub fn new<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&ConstraintArgs<'_>) -> f64 + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            f: Arc::new(f),
            gradient: None,
        }
    }

    /// Attach the exact gradient with respect to species amounts.
    pub fn with_amount_gradient<G>(mut self, g: G) -> Self
    where
        G: Fn(&ConstraintArgs<'_>) -> DVector<f64> + Send + Sync + 'static,
    {
        self.gradient = Some(Arc::new(g));
        self
    }

    pub fn residual(&self, args: &ConstraintArgs<'_>) -> f64 {
        (self.f)(args)
    }

    pub fn has_amount_gradient(&self) -> bool {
        self.gradient.is_some()
    }

    /// ∂v/∂n over every species, when known.
    pub fn amount_gradient(&self, args: &ConstraintArgs<'_>) -> Option<DVector<f64>> {
        self.gradient.as_ref().map(|g| g(args))
    }
}

impl fmt::Debug for EquationConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EquationConstraint")
            .field("name", &self.name)
            .field("amount_gradient", &self.gradient.is_some())
            .finish_non_exhaustive()
    }
}

/// Row i of ∂μ/∂n scaled by 1/RT, which is also ∂ln a_i/∂n.
fn scaled_potential_row(args: &ConstraintArgs<'_>, i: usize) -> DVector<f64> {
    let rt = args.rt();
    DVector::from_fn(args.n.len(), |j, _| args.props.dmu_dn[(i, j)] / rt)
}

/// Substance the system is open to; its amount is an extra unknown.
#[derive(Debug, Clone)]
pub struct Titrant {
    pub name: String,
    pub formula: ChemicalFormula,
    /// Element/charge coefficients over the system's element list.
    pub column: DVector<f64>,
}

/// Declares inputs, extra unknowns and auxiliary constraints of a class of
/// equilibrium problems.
///
/// Built once and reused across solves; immutable while a solve runs.
#[derive(Debug, Clone)]
pub struct EquilibriumSpecs {
    system: ChemicalSystem,
    inputs: Vec<Input>,
    constraints: Vec<EquationConstraint>,
    titrants: Vec<Titrant>,
}

impl EquilibriumSpecs {
    /// Empty specification: temperature and pressure are unknowns.
    pub fn new(system: &ChemicalSystem) -> Self {
        Self {
            system: system.clone(),
            inputs: Vec::new(),
            constraints: Vec::new(),
            titrants: Vec::new(),
        }
    }

    /// Temperature and pressure given; only species amounts are unknown.
    pub fn tp(system: &ChemicalSystem) -> Self {
        let mut specs = Self::new(system);
        specs.temperature();
        specs.pressure();
        specs
    }

    pub fn system(&self) -> &ChemicalSystem {
        &self.system
    }

    /// Declare temperature as an input.
    pub fn temperature(&mut self) {
        self.push_input(TEMPERATURE, Quantity::Temperature);
    }

    /// Declare pressure as an input.
    pub fn pressure(&mut self) {
        self.push_input(PRESSURE, Quantity::Pressure);
    }

    /// Declare a dimensionless input used by user constraints.
    pub fn add_input(&mut self, name: &str) -> SolverResult<()> {
        self.add_quantity_input(name, Quantity::Dimensionless)
    }

    /// Declare an input of a given quantity family (for unit conversion).
    pub fn add_quantity_input(&mut self, name: &str, quantity: Quantity) -> SolverResult<()> {
        if self.has_input(name) {
            return Err(SolverError::ProblemSetup {
                what: format!("input '{name}' declared twice"),
            });
        }
        self.inputs.push(Input {
            name: name.to_string(),
            quantity,
        });
        Ok(())
    }

    fn push_input(&mut self, name: &str, quantity: Quantity) {
        if !self.has_input(name) {
            self.inputs.push(Input {
                name: name.to_string(),
                quantity,
            });
        }
    }

    /// Add an auxiliary equality constraint.
    pub fn add_constraint<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&ConstraintArgs<'_>) -> f64 + Send + Sync + 'static,
    {
        self.constraints.push(EquationConstraint::new(name, f));
    }

    /// Add a prebuilt constraint, e.g. one carrying its amount gradient.
    pub fn add_equation(&mut self, constraint: EquationConstraint) {
        self.constraints.push(constraint);
    }

    /// Open the system to a substance: its amount becomes an extra unknown.
    ///
    /// Opening twice to the same formula is a no-op.
    pub fn open_to(&mut self, formula: &str) -> SolverResult<()> {
        let parsed = ChemicalFormula::parse(formula)?;
        if self.titrants.iter().any(|t| t.formula == parsed) {
            return Ok(());
        }
        let column = self.system.formula_vector(&parsed)?;
        self.titrants.push(Titrant {
            name: parsed.text().to_string(),
            formula: parsed,
            column,
        });
        Ok(())
    }

    /// Impose pH = −log10 a(H+) and open the system to H+.
    pub fn ph(&mut self) -> SolverResult<()> {
        let ih = self.system.species_index("H+")?;
        self.add_quantity_input(PH, Quantity::Dimensionless)?;
        self.open_to("H+")?;
        self.add_equation(
            EquationConstraint::new("pH", move |args| {
                args.props.ln_a[ih] + args.input_or_nan(PH) * std::f64::consts::LN_10
            })
            .with_amount_gradient(move |args| scaled_potential_row(args, ih)),
        );
        Ok(())
    }

    /// Impose ln a of a species; opens the system to that species.
    pub fn ln_activity<'a>(&mut self, species: impl Into<SpeciesRef<'a>>) -> SolverResult<()> {
        let (i, name, formula) = self.species_info(species)?;
        let input = format!("lnActivity[{name}]");
        self.add_quantity_input(&input, Quantity::Dimensionless)?;
        self.open_to(&formula)?;
        self.add_equation(
            EquationConstraint::new(input.clone(), move |args| {
                args.props.ln_a[i] - args.input_or_nan(&input)
            })
            .with_amount_gradient(move |args| scaled_potential_row(args, i)),
        );
        Ok(())
    }

    /// Impose the amount [mol] of a species; opens the system to that species.
    pub fn species_amount<'a>(&mut self, species: impl Into<SpeciesRef<'a>>) -> SolverResult<()> {
        let (i, name, formula) = self.species_info(species)?;
        let input = format!("n[{name}]");
        self.add_quantity_input(&input, Quantity::Amount)?;
        self.open_to(&formula)?;
        let scale_of = input.clone();
        self.add_equation(
            EquationConstraint::new(input.clone(), move |args| {
                let target = args.input_or_nan(&input);
                (args.n[i] - target) / target.abs().max(1.0)
            })
            .with_amount_gradient(move |args| {
                let scale = args.input_or_nan(&scale_of).abs().max(1.0);
                let mut g = DVector::zeros(args.n.len());
                g[i] = 1.0 / scale;
                g
            }),
        );
        Ok(())
    }

    /// Impose the chemical potential [J/mol] of a species; opens the system
    /// to that species.
    pub fn chemical_potential<'a>(&mut self, species: impl Into<SpeciesRef<'a>>) -> SolverResult<()> {
        let (i, name, formula) = self.species_info(species)?;
        let input = format!("u[{name}]");
        self.add_quantity_input(&input, Quantity::MolarEnergy)?;
        self.open_to(&formula)?;
        self.add_equation(
            EquationConstraint::new(input.clone(), move |args| {
                (args.props.mu[i] - args.input_or_nan(&input)) / args.rt()
            })
            .with_amount_gradient(move |args| scaled_potential_row(args, i)),
        );
        Ok(())
    }

    fn species_info<'a>(&self, species: impl Into<SpeciesRef<'a>>) -> SolverResult<(usize, String, String)> {
        let i = self.system.species_index(species)?;
        let s = &self.system.species()[i];
        Ok((i, s.name().to_string(), s.formula().text().to_string()))
    }

    pub fn has_input(&self, name: &str) -> bool {
        self.inputs.iter().any(|i| i.name == name)
    }

    pub fn is_temperature_input(&self) -> bool {
        self.has_input(TEMPERATURE)
    }

    pub fn is_pressure_input(&self) -> bool {
        self.has_input(PRESSURE)
    }

    pub fn inputs(&self) -> &[Input] {
        &self.inputs
    }

    pub fn constraints(&self) -> &[EquationConstraint] {
        &self.constraints
    }

    pub fn titrants(&self) -> &[Titrant] {
        &self.titrants
    }

    /// Unknowns beyond species amounts: T, P when not inputs, then titrants.
    pub fn num_extra_unknowns(&self) -> usize {
        usize::from(!self.is_temperature_input())
            + usize::from(!self.is_pressure_input())
            + self.titrants.len()
    }

    /// Constraints must match extra unknowns one to one.
    pub fn validate(&self) -> SolverResult<()> {
        let unknowns = self.num_extra_unknowns();
        let constraints = self.constraints.len();
        if unknowns != constraints {
            return Err(SolverError::ProblemSetup {
                what: format!(
                    "{constraints} auxiliary constraint(s) for {unknowns} extra unknown(s)"
                ),
            });
        }
        Ok(())
    }
}

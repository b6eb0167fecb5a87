//! Chemical property model trait, chaining and memoization.

use crate::error::{ChemError, ChemResult};
use crate::param::Param;
use nalgebra::{DMatrix, DVector};
use std::sync::{Arc, Mutex};

/// Chemical properties of every species at one (T, P, n).
///
/// Models add their contribution into these fields, so a record must be
/// [`reset`](Self::reset) before a fresh evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct ChemicalProps {
    /// Chemical potentials μ [J/mol].
    pub mu: DVector<f64>,
    /// Natural log of activities.
    pub ln_a: DVector<f64>,
    /// ∂μ/∂n [J/mol²].
    pub dmu_dn: DMatrix<f64>,
    /// ∂μ/∂T [J/(mol·K)].
    pub dmu_dt: DVector<f64>,
    /// ∂μ/∂P [J/(mol·Pa)].
    pub dmu_dp: DVector<f64>,
}

impl ChemicalProps {
    pub fn zeros(num_species: usize) -> Self {
        Self {
            mu: DVector::zeros(num_species),
            ln_a: DVector::zeros(num_species),
            dmu_dn: DMatrix::zeros(num_species, num_species),
            dmu_dt: DVector::zeros(num_species),
            dmu_dp: DVector::zeros(num_species),
        }
    }

    pub fn num_species(&self) -> usize {
        self.mu.len()
    }

    /// Zero every field in place.
    pub fn reset(&mut self) {
        self.mu.fill(0.0);
        self.ln_a.fill(0.0);
        self.dmu_dn.fill(0.0);
        self.dmu_dt.fill(0.0);
        self.dmu_dp.fill(0.0);
    }

    /// Whether every field is finite.
    pub fn is_finite(&self) -> bool {
        self.mu.iter().all(|v| v.is_finite())
            && self.ln_a.iter().all(|v| v.is_finite())
            && self.dmu_dn.iter().all(|v| v.is_finite())
            && self.dmu_dt.iter().all(|v| v.is_finite())
            && self.dmu_dp.iter().all(|v| v.is_finite())
    }
}

/// Evaluator of chemical potentials and their derivatives.
///
/// Implementations must be thread-safe (Send + Sync) and deterministic: the
/// same (T, P, n) and parameter values always give the same result.
pub trait ChemicalModel: Send + Sync {
    /// Model name (for debugging/logging).
    fn name(&self) -> &str;

    /// Add this model's contribution at temperature `t` [K], pressure `p`
    /// [Pa] and amounts `n` [mol] into `props`.
    fn evaluate(&self, props: &mut ChemicalProps, t: f64, p: f64, n: &DVector<f64>)
    -> ChemResult<()>;

    /// Parameters this model reads. Used for staleness checks.
    fn params(&self) -> Vec<Param> {
        Vec::new()
    }

    /// Reset `props` and evaluate into it.
    fn compute(&self, props: &mut ChemicalProps, t: f64, p: f64, n: &DVector<f64>) -> ChemResult<()> {
        if props.num_species() != n.len() {
            *props = ChemicalProps::zeros(n.len());
        } else {
            props.reset();
        }
        self.evaluate(props, t, p, n)?;
        if !props.is_finite() {
            return Err(ChemError::Evaluation {
                what: format!("{} produced non-finite properties", self.name()),
            });
        }
        Ok(())
    }
}

impl<M: ChemicalModel + ?Sized> ChemicalModel for Arc<M> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn evaluate(&self, props: &mut ChemicalProps, t: f64, p: f64, n: &DVector<f64>) -> ChemResult<()> {
        (**self).evaluate(props, t, p, n)
    }

    fn params(&self) -> Vec<Param> {
        (**self).params()
    }
}

impl<M: ChemicalModel + ?Sized> ChemicalModel for Box<M> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn evaluate(&self, props: &mut ChemicalProps, t: f64, p: f64, n: &DVector<f64>) -> ChemResult<()> {
        (**self).evaluate(props, t, p, n)
    }

    fn params(&self) -> Vec<Param> {
        (**self).params()
    }
}

/// Sequence of models whose contributions add up.
pub struct Chain {
    links: Vec<Box<dyn ChemicalModel>>,
}

/// Compose models: each link adds its contribution to the same record.
pub fn chain(links: Vec<Box<dyn ChemicalModel>>) -> Chain {
    Chain { links }
}

impl Chain {
    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

impl ChemicalModel for Chain {
    fn name(&self) -> &str {
        "Chain"
    }

    fn evaluate(&self, props: &mut ChemicalProps, t: f64, p: f64, n: &DVector<f64>) -> ChemResult<()> {
        for link in &self.links {
            link.evaluate(props, t, p, n)?;
        }
        Ok(())
    }

    fn params(&self) -> Vec<Param> {
        self.links.iter().flat_map(|l| l.params()).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
struct CacheKey {
    t: f64,
    p: f64,
    n: DVector<f64>,
    versions: Vec<u64>,
}

/// Caches the last evaluation of an inner model.
///
/// The cache is reused when (T, P, n) match bitwise and no parameter of the
/// inner model has been `set` since.
pub struct Memoized<M> {
    inner: M,
    params: Vec<Param>,
    cache: Mutex<Option<(CacheKey, ChemicalProps)>>,
}

impl<M: ChemicalModel> Memoized<M> {
    pub fn new(inner: M) -> Self {
        let params = inner.params();
        Self {
            inner,
            params,
            cache: Mutex::new(None),
        }
    }

    pub fn inner(&self) -> &M {
        &self.inner
    }

    fn key(&self, t: f64, p: f64, n: &DVector<f64>) -> CacheKey {
        CacheKey {
            t,
            p,
            n: n.clone(),
            versions: self.params.iter().map(Param::version).collect(),
        }
    }
}

/// Wrap a model in a [`Memoized`] cache.
pub fn with_memoization<M: ChemicalModel>(model: M) -> Memoized<M> {
    Memoized::new(model)
}

impl<M: ChemicalModel> ChemicalModel for Memoized<M> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn evaluate(&self, props: &mut ChemicalProps, t: f64, p: f64, n: &DVector<f64>) -> ChemResult<()> {
        let key = self.key(t, p, n);
        let mut cache = self.cache.lock().map_err(|_| ChemError::Evaluation {
            what: "memoization cache poisoned".to_string(),
        })?;

        if let Some((cached_key, cached)) = cache.as_ref() {
            if *cached_key == key {
                add_into(props, cached);
                return Ok(());
            }
        }

        let mut fresh = ChemicalProps::zeros(n.len());
        self.inner.evaluate(&mut fresh, t, p, n)?;
        add_into(props, &fresh);
        *cache = Some((key, fresh));
        Ok(())
    }

    fn params(&self) -> Vec<Param> {
        self.params.clone()
    }
}

fn add_into(props: &mut ChemicalProps, other: &ChemicalProps) {
    props.mu += &other.mu;
    props.ln_a += &other.ln_a;
    props.dmu_dn += &other.dmu_dn;
    props.dmu_dt += &other.dmu_dt;
    props.dmu_dp += &other.dmu_dp;
}

//! Cached operator lookup
//!
//! The factory resolves `(module, type name)` pairs in two steps:
//!
//! 1. load the module through a [`ModuleLoader`] (once per module name)
//! 2. build the operator for the type (once per pair)
//!
//! Both steps cache their outcome, including failure. A module that cannot
//! be loaded or a type it does not contain yields `None` now and on every
//! later lookup, without asking the loader again. Failures are reported once
//! as a warning and never propagate to the caller.
//!
//! Modules load under a per-module lock only. Lookups of other modules
//! proceed while a load runs, including lookups the loader makes itself.
//! A loader must not look up the module it is loading.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use anyhow::Context;
use tracing::{debug, trace, warn};

use super::{MeasurementModule, MeasurementOperator};

/// Source of measurement modules
pub trait ModuleLoader: Send + Sync {
    fn load(&self, module: &str) -> anyhow::Result<Arc<MeasurementModule>>;
}

/// Modules registered explicitly at startup
#[derive(Debug, Default, Clone)]
pub struct ModuleRegistry {
    modules: HashMap<String, Arc<MeasurementModule>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every module shipped with this crate
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(crate::probes::timeofday::measurement_module());
        registry
    }

    /// Register `module` under its name, replacing any previous one
    pub fn register(&mut self, module: MeasurementModule) -> &mut Self {
        debug!("registering measurement module {}", module.name());
        self.modules
            .insert(module.name().to_string(), Arc::new(module));
        self
    }

    pub fn with_module(mut self, module: MeasurementModule) -> Self {
        self.register(module);
        self
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl ModuleLoader for ModuleRegistry {
    fn load(&self, module: &str) -> anyhow::Result<Arc<MeasurementModule>> {
        self.modules
            .get(module)
            .cloned()
            .with_context(|| format!("no measurement module registered as {module}"))
    }
}

#[derive(Debug)]
enum ModuleEntry {
    Unavailable,
    Loaded {
        module: Arc<MeasurementModule>,
        operators: Mutex<HashMap<String, Option<Arc<MeasurementOperator>>>>,
    },
}

type ModuleSlot = Arc<OnceLock<ModuleEntry>>;

/// Process-wide operator cache keyed by `(module, type name)`
pub struct OperatorFactory<L = ModuleRegistry> {
    loader: L,
    cache: Mutex<HashMap<String, ModuleSlot>>,
}

impl OperatorFactory<ModuleRegistry> {
    /// Factory over the modules shipped with this crate
    pub fn builtin() -> Self {
        Self::new(ModuleRegistry::builtin())
    }
}

impl<L: ModuleLoader> OperatorFactory<L> {
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    fn cache(&self) -> MutexGuard<'_, HashMap<String, ModuleSlot>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn load(&self, module: &str) -> ModuleEntry {
        match self.loader.load(module) {
            Ok(loaded) => {
                trace!("loaded measurement module {module}");
                ModuleEntry::Loaded {
                    module: loaded,
                    operators: Mutex::new(HashMap::new()),
                }
            }
            Err(err) => {
                warn!(module, "measurement module unavailable: {err:#}");
                ModuleEntry::Unavailable
            }
        }
    }

    /// Look up the operator for `type_name` in `module`
    ///
    /// Returns `None` if the module cannot be loaded or does not contain the
    /// type. Repeated calls return the same cached result.
    pub fn operator(&self, module: &str, type_name: &str) -> Option<Arc<MeasurementOperator>> {
        let slot = Arc::clone(self.cache().entry(module.to_string()).or_default());

        let ModuleEntry::Loaded {
            module: loaded,
            operators,
        } = slot.get_or_init(|| self.load(module))
        else {
            return None;
        };

        operators
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(type_name.to_string())
            .or_insert_with(|| match loaded.build_operator(type_name) {
                Some(operator) => {
                    trace!("built operator for {module}/{type_name}");
                    Some(Arc::new(operator))
                }
                None => {
                    warn!(module, type_name, "measurement type not found in module");
                    None
                }
            })
            .clone()
    }

    /// Number of cached `(module, type name)` results, hits and misses alike
    pub fn cached_operators(&self) -> usize {
        self.cache()
            .values()
            .map(|slot| match slot.get() {
                Some(ModuleEntry::Loaded { operators, .. }) => operators
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .len(),
                Some(ModuleEntry::Unavailable) | None => 0,
            })
            .sum()
    }
}

impl<L> std::fmt::Debug for OperatorFactory<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        let mut modules: Vec<_> = cache.keys().collect();
        modules.sort_unstable();

        f.debug_struct("OperatorFactory")
            .field("modules", &modules)
            .finish_non_exhaustive()
    }
}

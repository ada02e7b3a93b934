//! Search methods on PartsApi.

use std::sync::Arc;

use crate::calculator::{self, Calculation, CalculatorInputs};
use crate::error::Result;
use crate::part_number::{self, PrefixInputs};
use crate::search::{self, SearchConfig, SearchSession};
use crate::PartsApi;

impl PartsApi {
    // ========================================
    // Search Methods
    // ========================================

    /// Create a search session over the parts store.
    pub fn new_session(&self) -> SearchSession {
        SearchSession::new(Arc::new(self.store.clone()), self.limits)
    }

    /// Resolve the search configuration for a part-type key.
    pub fn search_config(&self, part_type: &str) -> Result<SearchConfig> {
        search::search_config_for(part_type)
    }

    /// All part-type keys with a search configuration.
    pub fn part_type_keys(&self) -> Vec<&'static str> {
        search::part_type_keys()
    }

    // ========================================
    // Calculator Methods
    // ========================================

    /// Part-number prefix for calculator inputs, used as a search term.
    pub fn generate_prefix(&self, inputs: &PrefixInputs) -> String {
        part_number::generate_prefix(inputs)
    }

    /// Material figures for the calculator form.
    pub fn calculate(&self, inputs: &CalculatorInputs) -> Result<Calculation> {
        calculator::calculate(inputs)
    }
}

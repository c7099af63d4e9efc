//! Relative band power and the concentration ratio

use focus_core::{BandPowerSet, ConcentrationBands, FocusError, FocusResult, NormalizedPowerSet};

/// Turns raw band powers into fractions and a concentration score
#[derive(Debug, Clone, PartialEq)]
pub struct PowerNormalizer {
    bands: ConcentrationBands,
}

impl PowerNormalizer {
    pub fn new(bands: ConcentrationBands) -> Self {
        Self { bands }
    }

    pub fn focus_band(&self) -> &str {
        &self.bands.focus_band
    }

    pub fn relax_band(&self) -> &str {
        &self.bands.relax_band
    }

    /// Each band's share of the total power, in band order
    pub fn normalize(&self, powers: &BandPowerSet) -> FocusResult<NormalizedPowerSet> {
        normalize(powers)
    }

    /// `focus / (relax + focus)` over normalized shares, in `[0, 1]`
    pub fn concentration(&self, shares: &NormalizedPowerSet) -> FocusResult<f64> {
        let focus = shares.require(&self.bands.focus_band)?;
        let relax = shares.require(&self.bands.relax_band)?;

        let denominator = relax + focus;
        if denominator == 0.0 {
            return Err(FocusError::UndefinedConcentration);
        }
        Ok((focus / denominator).clamp(0.0, 1.0))
    }
}

impl Default for PowerNormalizer {
    fn default() -> Self {
        Self::new(ConcentrationBands::default())
    }
}

/// Divide every power by the total
pub fn normalize(powers: &BandPowerSet) -> FocusResult<NormalizedPowerSet> {
    let total = powers.total();
    if total == 0.0 {
        return Err(FocusError::ZeroTotalPower);
    }

    let fractions = powers
        .iter()
        .map(|(name, power)| (name.to_string(), power / total))
        .collect();
    Ok(NormalizedPowerSet::from_fractions(fractions))
}

use crate::cli::InputFormat;
use clanspp::core::models::similarity::ValueKind;
use clanspp::engine::config::LayoutParameters;

pub struct DefaultsConfig {
    pub format: InputFormat,
    pub kind: ValueKind,
    pub threshold: f64,
    pub dimensions: u8,
    pub rounds: u64,
    pub layout: LayoutParameters,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            format: InputFormat::Triples,
            kind: ValueKind::Evalue,
            threshold: 1e-10,
            dimensions: 3,
            rounds: 0,
            // Unbounded runs only end if the layout cools.
            layout: LayoutParameters {
                cooling: 0.99,
                ..LayoutParameters::default()
            },
        }
    }
}

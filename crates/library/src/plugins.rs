//! Plugin catalog
//!
//! The host calls [`provide_plugins`] once at startup and lists the entries
//! by category.

use sdpanel_core::registry::PluginEntry;

use crate::{filters, normalize, psf};

pub const CATEGORY_PSF: &str = "PSF";
pub const CATEGORY_FILTERS: &str = "Filters";
pub const CATEGORY_INTENSITY: &str = "Intensity";

/// Every plugin this library offers.
pub fn provide_plugins() -> Vec<PluginEntry> {
    vec![
        PluginEntry::new(
            "gaussian_psf_2d",
            "Gaussian PSF 2D",
            CATEGORY_PSF,
            "Normalized 2D Gaussian point spread function",
            psf::schema_2d,
        ),
        PluginEntry::new(
            "gaussian_psf_3d",
            "Gaussian PSF 3D",
            CATEGORY_PSF,
            "Normalized 3D Gaussian point spread function with per-axis sigma",
            psf::schema_3d,
        ),
        PluginEntry::new(
            "gaussian_blur",
            "Gaussian Blur",
            CATEGORY_FILTERS,
            "Isotropic Gaussian smoothing",
            filters::blur_schema,
        ),
        PluginEntry::new(
            "smooth_split",
            "Smooth / Detail Split",
            CATEGORY_FILTERS,
            "Split an image into a smooth part and the residual detail",
            filters::split_schema,
        ),
        PluginEntry::new(
            "normalize_intensity",
            "Normalize Intensity",
            CATEGORY_INTENSITY,
            "Percentile-based intensity rescaling to [0, 1]",
            normalize::schema,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdpanel_core::registry::{categories, find};

    #[test]
    fn test_ids_unique_and_schemas_build() {
        let entries = provide_plugins();
        for (i, e) in entries.iter().enumerate() {
            assert!(entries[i + 1..].iter().all(|o| o.id != e.id), "duplicate id {}", e.id);
            let schema = e.schema().unwrap();
            assert_eq!(schema.name(), e.id);
        }
    }

    #[test]
    fn test_categories() {
        let entries = provide_plugins();
        assert_eq!(
            categories(&entries),
            vec![CATEGORY_PSF, CATEGORY_FILTERS, CATEGORY_INTENSITY]
        );
        assert!(find(&entries, "normalize_intensity").is_some());
    }

    #[test]
    fn test_only_normalize_receives_observers() {
        for e in provide_plugins() {
            let schema = e.schema().unwrap();
            assert_eq!(schema.accepts_observers(), e.id == "normalize_intensity");
        }
    }
}

use commodel_core::community::{
    create_community_model_with_balanced_growth, generate_community_model_with_no_growth,
    generate_redcom_community_model, load_community,
};
use commodel_core::io::write_model;
use indexmap::IndexMap;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

fn to_py_err<E: std::fmt::Display>(err: E) -> PyErr {
    PyValueError::new_err(err.to_string())
}

/// Build a community model from a JSON community definition and write it to `output_path`
///
/// `flavour` is one of `"redcom"`, `"no_growth"` (requires `fractions`) or
/// `"balanced_growth"` (requires `growth_rate`). The output format follows the extension of
/// `output_path`.
#[pyfunction]
#[pyo3(signature = (definition_path, output_path, flavour, growth_rate=None, fractions=None, biomass_reactions=None))]
fn build_community_sbml(
    definition_path: &str,
    output_path: &str,
    flavour: &str,
    growth_rate: Option<f64>,
    fractions: Option<IndexMap<String, f64>>,
    biomass_reactions: Option<IndexMap<String, String>>,
) -> PyResult<()> {
    let community = load_community(definition_path).map_err(to_py_err)?;
    let model = match flavour {
        "redcom" => generate_redcom_community_model(&community),
        "no_growth" => {
            let fractions = fractions
                .ok_or_else(|| PyValueError::new_err("no_growth requires fractions"))?;
            generate_community_model_with_no_growth(
                &community,
                &fractions,
                &biomass_reactions.unwrap_or_default(),
            )
        }
        "balanced_growth" => {
            let growth_rate = growth_rate
                .ok_or_else(|| PyValueError::new_err("balanced_growth requires growth_rate"))?;
            create_community_model_with_balanced_growth(&community, growth_rate)
        }
        other => {
            return Err(PyValueError::new_err(format!(
                "Unknown community flavour {}",
                other
            )))
        }
    }
    .map_err(to_py_err)?;
    write_model(&model, output_path).map_err(to_py_err)
}

/// A Python module implemented in Rust. The name of this function must match
/// the `lib.name` setting in the `Cargo.toml`, else Python will not be able to
/// import the module.
#[pymodule]
fn _core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(build_community_sbml, m)?)?;
    Ok(())
}

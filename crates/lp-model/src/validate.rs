use crate::error::{ModelError, ModelResult};
use crate::schema::{BlockDef, ModelDef};

/// Structural checks that do not need the constants resolved.
pub fn validate_model(model: &ModelDef) -> ModelResult<()> {
    for name in model.constants.keys() {
        if !is_identifier(name) {
            return Err(ModelError::config(format!(
                "constant name '{name}' is not a valid identifier"
            )));
        }
    }

    validate_blocks("controllers", &model.controllers)?;
    validate_blocks("plants", &model.plants)?;

    if let Some(args) = &model.pd_args {
        let finite = args.phase_margin_deg.is_finite()
            && args.integral_gain.is_finite()
            && args.crossover_rad_s.is_finite();
        if !finite {
            return Err(ModelError::config("pd_args must be finite"));
        }
        if args.crossover_rad_s <= 0.0 {
            return Err(ModelError::config("pd_args.Wc must be positive"));
        }
    }

    Ok(())
}

fn validate_blocks(section: &str, blocks: &[BlockDef]) -> ModelResult<()> {
    for (i, block) in blocks.iter().enumerate() {
        if block.num.is_empty() {
            return Err(ModelError::config(format!("{section}[{i}].num is empty")));
        }
        if block.den.is_empty() {
            return Err(ModelError::config(format!("{section}[{i}].den is empty")));
        }
    }
    Ok(())
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

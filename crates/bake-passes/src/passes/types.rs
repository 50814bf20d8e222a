use bake_core::error::Result;
use bake_core::model::{Project, VarId};
use bake_core::vartypes;
use tracing::debug;

/// Normalizes variables' values with respect to their types (e.g. a
/// scalar expression assigned to a list-typed variable becomes a
/// single-item list), then validates them.
///
/// The three sweeps are order-dependent: conditions are canonicalized
/// before general coercion, and every variable is normalized before any
/// is validated, because validation may follow references into other
/// variables' values.
pub fn normalize_and_validate_vars(project: &mut Project) -> Result<()> {
    let ids: Vec<VarId> = project.all_variables().collect();

    debug!("checking boolean expressions");
    for &id in &ids {
        let name = project.var(id).name.clone();
        let value = project.take_value(id);
        let value = vartypes::normalize_bool_subexpressions(&name, value)?;
        project.set_value(id, value);
    }

    debug!("normalizing variables");
    for &id in &ids {
        let ty = project.var(id).ty.clone();
        let value = project.take_value(id);
        project.set_value(id, ty.normalize(value));
    }

    debug!("checking types of variables");
    for &id in &ids {
        let var = project.var(id);
        var.ty.validate(&var.name, &var.value)?;
    }

    Ok(())
}

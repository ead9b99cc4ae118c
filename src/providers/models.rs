use workbench_schema::{OpenaiModel, OpenaiModelList};

use super::ProviderKind;
use crate::db::DbModelOverride;

/// Built-in models for `kind` merged with stored overrides.
///
/// Disabled overrides hide the model; enabled overrides for unknown ids add
/// a custom entry; `display_name` replaces the listed name.
pub fn merged_model_list(kind: ProviderKind, overrides: &[DbModelOverride]) -> OpenaiModelList {
    let owned_by = kind.name();
    let mut list = OpenaiModelList::from_model_names(kind.default_models().iter().copied(), owned_by);

    for ov in overrides.iter().filter(|ov| ov.provider == owned_by) {
        if !ov.enabled {
            list.data.retain(|m| m.id != ov.model);
            continue;
        }
        if list.find_mut(&ov.model).is_none() {
            list.data.push(OpenaiModel::new(ov.model.clone(), owned_by));
        }
        if let (Some(model), Some(name)) = (list.find_mut(&ov.model), ov.display_name.as_ref()) {
            model.display_name.clone_from(name);
        }
    }

    list
}

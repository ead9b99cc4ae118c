use serde::{Deserialize, Serialize};

/// OpenAI-style `{ "object": "list", "data": [...] }` model listing.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OpenaiModelList {
    pub object: String,
    pub data: Vec<OpenaiModel>,
}

impl Default for OpenaiModelList {
    fn default() -> Self {
        Self {
            object: "list".to_string(),
            data: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OpenaiModel {
    pub id: String,
    pub object: String,
    pub owned_by: String,
    pub display_name: String,
}

impl OpenaiModel {
    pub fn new(id: impl Into<String>, owned_by: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            display_name: id.clone(),
            id,
            object: "model".to_string(),
            owned_by: owned_by.into(),
        }
    }
}

impl OpenaiModelList {
    pub fn from_model_names<I, S>(models_list: I, owned_by: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let data = models_list
            .into_iter()
            .map(|model| OpenaiModel::new(model, owned_by))
            .collect();

        Self {
            data,
            ..Default::default()
        }
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut OpenaiModel> {
        self.data.iter_mut().find(|m| m.id == id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.data.iter().map(|m| m.id.as_str())
    }
}

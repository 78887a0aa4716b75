use crate::{
    error::NavigationError,
    handler::{ItemsProducer, MenuRequest},
    text::Text,
};
use serde_json::Value;
use std::sync::Arc;

/// A declarative list of choices rendered as a numbered menu
///
/// Items are JSON values: scalars display as-is, objects display the field
/// named by [`key`](ListInput::key), arrays the element at
/// [`index`](ListInput::index). Selections are validated by 1-based index
/// and resolved back to the underlying item on capture.
pub struct ListInput {
    items: Items,
    title: Text,
    key: Option<String>,
    idx: Option<usize>,
    extra: Option<String>,
    empty_list_message: Option<Text>,
}

enum Items {
    Fixed(Vec<Value>),
    Producer(Arc<dyn ItemsProducer>),
}

impl ListInput {
    /// Creates a list over a fixed set of items
    pub fn new<T, I, V>(title: T, items: I) -> Self
    where
        T: Into<Text>,
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self {
            items: Items::Fixed(items.into_iter().map(Into::into).collect()),
            title: title.into(),
            key: None,
            idx: None,
            extra: None,
            empty_list_message: None,
        }
    }

    /// Creates a list whose items are produced at render time
    pub fn with_producer<T, P>(title: T, producer: P) -> Self
    where
        T: Into<Text>,
        P: ItemsProducer + 'static,
    {
        Self {
            items: Items::Producer(Arc::new(producer)),
            title: title.into(),
            key: None,
            idx: None,
            extra: None,
            empty_list_message: None,
        }
    }

    /// Field displayed for object items
    pub fn key<S: Into<String>>(mut self, key: S) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Element displayed for array items
    pub fn index(mut self, idx: usize) -> Self {
        self.idx = Some(idx);
        self
    }

    /// Extra text appended after the items
    pub fn extra<S: Into<String>>(mut self, extra: S) -> Self {
        self.extra = Some(extra.into());
        self
    }

    /// Message shown instead of the menu when the item list is empty
    ///
    /// Used verbatim, so it carries its own `CON `/`END ` prefix.
    pub fn empty_list_message<T: Into<Text>>(mut self, message: T) -> Self {
        self.empty_list_message = Some(message.into());
        self
    }

    async fn resolve_items(&self, request: &MenuRequest<'_>) -> Result<Vec<Value>, NavigationError> {
        match &self.items {
            Items::Fixed(items) => Ok(items.clone()),
            Items::Producer(producer) => producer.produce(request).await.map_err(|err| {
                NavigationError::ImproperlyConfigured(format!("items producer failed: {}", err))
            }),
        }
    }

    pub(crate) async fn render(&self, request: &MenuRequest<'_>) -> Result<String, NavigationError> {
        let items = self.resolve_items(request).await?;
        if items.is_empty() {
            let message = self.empty_list_message.as_ref().ok_or_else(|| {
                NavigationError::ImproperlyConfigured(
                    "the item list is empty and no empty list message is set".to_string(),
                )
            })?;
            return Ok(message.resolve(request.lang)?.to_string());
        }
        let mut lines = Vec::with_capacity(items.len());
        for (position, item) in items.iter().enumerate() {
            lines.push(format!(
                "{}. {}",
                position + 1,
                self.display(item, request.lang)?
            ));
        }
        let mut menu = format!(
            "CON {}\n{}",
            self.title.resolve(request.lang)?,
            lines.join("\n")
        );
        if let Some(extra) = &self.extra {
            menu.push('\n');
            menu.push_str(extra);
        }
        Ok(menu)
    }

    pub(crate) async fn validate(
        &self,
        input: Option<&str>,
        request: &MenuRequest<'_>,
    ) -> Result<bool, NavigationError> {
        let choice = match input.and_then(|input| input.parse::<usize>().ok()) {
            Some(choice) => choice,
            None => return Ok(false),
        };
        let items = self.resolve_items(request).await?;
        Ok(choice >= 1 && choice <= items.len())
    }

    pub(crate) async fn item(
        &self,
        choice: i64,
        request: &MenuRequest<'_>,
    ) -> Result<Option<Value>, NavigationError> {
        let items = self.resolve_items(request).await?;
        if choice >= 1 && (choice as usize) <= items.len() {
            Ok(Some(items[choice as usize - 1].clone()))
        } else {
            Ok(None)
        }
    }

    fn display(&self, item: &Value, lang: Option<&str>) -> Result<String, NavigationError> {
        let displayed = match item {
            Value::Object(fields) => {
                let key = self.key.as_ref().ok_or_else(|| {
                    NavigationError::ImproperlyConfigured(
                        "a `key` accessor is required for object list items".to_string(),
                    )
                })?;
                fields.get(key).ok_or_else(|| {
                    NavigationError::ImproperlyConfigured(format!(
                        "list item has no field '{}'",
                        key
                    ))
                })?
            }
            Value::Array(elements) => {
                let idx = self.idx.ok_or_else(|| {
                    NavigationError::ImproperlyConfigured(
                        "an `index` accessor is required for array list items".to_string(),
                    )
                })?;
                elements.get(idx).ok_or_else(|| {
                    NavigationError::ImproperlyConfigured(format!(
                        "list item has no element {}",
                        idx
                    ))
                })?
            }
            other => other,
        };
        match (displayed, lang) {
            (Value::Object(translations), Some(lang)) => translations
                .get(lang)
                .map(display_value)
                .ok_or_else(|| {
                    NavigationError::Translation(format!(
                        "translation for language '{}' was not found",
                        lang
                    ))
                }),
            (value, _) => Ok(display_value(value)),
        }
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(value) => value.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Config,
        context::TurnContext,
        handler::Scope,
        session::{memory::MemoryBackend, SessionManager, StatePatch},
    };
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn create_context(ussd_string: &str) -> TurnContext {
        let manager = SessionManager::new(MemoryBackend::new());
        TurnContext::new(
            "254700000001",
            "session-1",
            ussd_string,
            manager.get_session("254700000001", "session-1"),
            Arc::new(Config::new()),
        )
    }

    macro_rules! request {
        ($context:expr, $data:expr, $state:expr, $scope:expr) => {
            MenuRequest {
                context: &$context,
                input: None,
                lang: None,
                data: &$data,
                state: &$state,
                scope: $scope,
            }
        };
    }

    #[tokio::test]
    async fn render_scalars() {
        let list = ListInput::new("Choose:", vec!["Sun", "Moon"]);
        let context = create_context("1");
        let (data, state) = (HashMap::new(), StatePatch::new());
        let menu = list
            .render(&request!(context, data, state, Scope::Menu))
            .await
            .unwrap();
        assert_eq!(menu, "CON Choose:\n1. Sun\n2. Moon");
    }

    #[tokio::test]
    async fn render_objects_with_key_and_extra() {
        let list = ListInput::new(
            "Accounts",
            vec![
                json!({"id": 11, "label": "Savings"}),
                json!({"id": 12, "label": "Loans"}),
            ],
        )
        .key("label")
        .extra("98. More");
        let context = create_context("1");
        let (data, state) = (HashMap::new(), StatePatch::new());
        let menu = list
            .render(&request!(context, data, state, Scope::Menu))
            .await
            .unwrap();
        assert_eq!(menu, "CON Accounts\n1. Savings\n2. Loans\n98. More");
    }

    #[tokio::test]
    async fn render_empty_list_message() {
        let list = ListInput::new("Accounts", Vec::<Value>::new())
            .empty_list_message("END You have no accounts");
        let context = create_context("1");
        let (data, state) = (HashMap::new(), StatePatch::new());
        let menu = list
            .render(&request!(context, data, state, Scope::Menu))
            .await
            .unwrap();
        assert_eq!(menu, "END You have no accounts");
    }

    #[tokio::test]
    async fn validate_by_index() {
        let list = ListInput::new("Choose:", vec!["Sun", "Moon"]);
        let context = create_context("1");
        let (data, state) = (HashMap::new(), StatePatch::new());
        for (input, expected) in vec![
            (Some("1"), true),
            (Some("2"), true),
            (Some("0"), false),
            (Some("3"), false),
            (Some("one"), false),
            (None, false),
        ] {
            let valid = list
                .validate(input, &request!(context, data, state, Scope::Validate))
                .await
                .unwrap();
            assert_eq!(valid, expected, "input {:?}", input);
        }
    }

    #[tokio::test]
    async fn item_resolution() {
        let list = ListInput::new("Choose:", vec!["Sun", "Moon"]);
        let context = create_context("1");
        let (data, state) = (HashMap::new(), StatePatch::new());
        let item = list
            .item(1, &request!(context, data, state, Scope::Select))
            .await
            .unwrap();
        assert_eq!(item, Some(json!("Sun")));
        let item = list
            .item(3, &request!(context, data, state, Scope::Select))
            .await
            .unwrap();
        assert_eq!(item, None);
    }

    #[tokio::test]
    async fn produced_items() {
        fn producer(request: &MenuRequest<'_>) -> Result<Vec<Value>, anyhow::Error> {
            assert_eq!(request.scope, Scope::Menu);
            Ok(vec![json!("Sun")])
        }
        let list = ListInput::with_producer("Choose:", producer);
        let context = create_context("1");
        let (data, state) = (HashMap::new(), StatePatch::new());
        let menu = list
            .render(&request!(context, data, state, Scope::Menu))
            .await
            .unwrap();
        assert_eq!(menu, "CON Choose:\n1. Sun");
    }

    #[tokio::test]
    async fn localized_object_display() {
        let list = ListInput::new(
            Text::localized(vec![("en", "Fruits"), ("sw", "Matunda")]),
            vec![json!({"name": {"en": "Apple", "sw": "Tofaa"}})],
        )
        .key("name");
        let context = create_context("1");
        let (data, state) = (HashMap::new(), StatePatch::new());
        let mut request = request!(context, data, state, Scope::Menu);
        request.lang = Some("sw");
        let menu = list.render(&request).await.unwrap();
        assert_eq!(menu, "CON Matunda\n1. Tofaa");
    }
}

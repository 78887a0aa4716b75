use crate::{
    channel::response_body,
    context::TurnContext,
    error::NavigationError,
    handler::{MenuProducer, MenuRequest, PostCall, Scope, StepValidator, Validation},
    list::ListInput,
    session::{StatePatch, FORM_STEP, RESPONSE_MENU_NAME, VALID_LAST_INPUT},
    text::Text,
};
use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

/// The outcome of rendering a node for one turn
pub(crate) struct Rendered {
    pub(crate) text: String,
    pub(crate) state: StatePatch,
    pub(crate) valid: Option<bool>,
}

/// An ordered, step by step questionnaire with per step validation
///
/// Steps are numbered from 1. Each turn the flow validates the submitted
/// input against the awaited step, captures it into the session under the
/// step's name, and emits the next prompt. The back token rewinds one step.
pub struct FormFlow {
    questions: BTreeMap<i64, FormStep>,
    validator: Arc<dyn StepValidator>,
}

impl FormFlow {
    /// Creates a new form
    ///
    /// # Arguments
    ///
    /// * validator - Callback validating the input of every step
    pub fn new<V>(validator: V) -> Self
    where
        V: StepValidator + 'static,
    {
        Self {
            questions: BTreeMap::new(),
            validator: Arc::new(validator),
        }
    }

    /// Appends a step, numbering it after the last one
    pub fn step(self, step: FormStep) -> Self {
        let number = self.questions.keys().next_back().copied().unwrap_or(0) + 1;
        self.step_at(number, step)
    }

    /// Adds a step under an explicit number
    ///
    /// Useful together with a validator that patches `FORM_STEP` to jump
    /// around the form.
    pub fn step_at(mut self, number: i64, step: FormStep) -> Self {
        self.questions.insert(number, step);
        self
    }

    pub(crate) async fn respond(
        &self,
        current_step: i64,
        input: Option<&str>,
        context: &TurnContext,
        lang: Option<&str>,
    ) -> Result<Rendered, NavigationError> {
        let back_symbol = context.config.get_back_symbol();
        let home_symbol = context.config.get_home_symbol();
        let mut step = current_step;
        let mut state = StatePatch::new();
        let going_back = input == Some(back_symbol);

        let valid = if going_back {
            step -= 2;
            state.set(FORM_STEP, step);
            true
        } else {
            match self.questions.get(&step).map(|question| &question.menu) {
                Some(StepMenu::List(list)) => {
                    let data = HashMap::new();
                    let request = MenuRequest {
                        context,
                        input,
                        lang,
                        data: &data,
                        state: &state,
                        scope: Scope::Validate,
                    };
                    let valid = list.validate(input, &request).await?;
                    // the verdict comes from the list; the validator only
                    // contributes side effect data
                    match self
                        .validator
                        .validate(step, input, context)
                        .await
                        .map_err(NavigationError::Validator)?
                    {
                        Validation::Checked { state: extra, .. } | Validation::State(extra) => {
                            state.merge(extra)
                        }
                    }
                    valid
                }
                _ => match self
                    .validator
                    .validate(step, input, context)
                    .await
                    .map_err(NavigationError::Validator)?
                {
                    Validation::Checked { valid, state: extra } => {
                        state.merge(extra);
                        valid
                    }
                    Validation::State(extra) => {
                        log::warn!(
                            "input not validated explicitly by the step validator, assuming it is valid"
                        );
                        state.merge(extra);
                        true
                    }
                },
            }
        };

        if !valid {
            state.set(VALID_LAST_INPUT, 0);
            state.set(RESPONSE_MENU_NAME, "ERROR");
            let question = self.questions.get(&step).ok_or_else(|| {
                NavigationError::ImproperlyConfigured(format!("form has no step {}", step))
            })?;
            let menu = self
                .render_step_menu(&question.menu, context, input, lang, &state, None)
                .await?;
            let text = context
                .config
                .get_invalid_input(lang)
                .replace("{menu}", response_body(&menu));
            return Ok(Rendered {
                text,
                state,
                valid: Some(false),
            });
        }

        state.set(VALID_LAST_INPUT, 1);
        let navigation_token =
            matches!(input, Some(input) if input == back_symbol || input == home_symbol);
        let mut captured: Option<(String, String)> = None;
        if step != 0 && !navigation_token {
            if let Some(question) = self.questions.get(&step) {
                if is_identifier(&question.name) {
                    match &question.menu {
                        StepMenu::List(list) => {
                            if let Some(choice) =
                                input.and_then(|input| input.parse::<i64>().ok())
                            {
                                let data = HashMap::new();
                                let request = MenuRequest {
                                    context,
                                    input,
                                    lang,
                                    data: &data,
                                    state: &state,
                                    scope: Scope::Select,
                                };
                                if let Some(item) = list.item(choice, &request).await? {
                                    state.set(format!("{}_VALUE", question.name), choice - 1);
                                    state.set(question.name.clone(), item);
                                }
                            }
                        }
                        _ => {
                            let value = input.unwrap_or_default();
                            state.set(format!("{}_VALUE", question.name), value);
                            state.set(question.name.clone(), value);
                        }
                    }
                } else {
                    log::warn!(
                        "field name {:?} is not a valid identifier, value not captured",
                        question.name
                    );
                }
                if let Some(input) = input {
                    captured = Some((question.name.clone(), input.to_string()));
                }
                if let Some(post_call) = &question.post_call {
                    let mut data = self.gather_data(context).await?;
                    if let Some((name, value)) = &captured {
                        data.insert(name.clone(), value.clone());
                    }
                    post_call
                        .call(context, data)
                        .await
                        .map_err(NavigationError::PostCall)?;
                }
            }
        }

        match self.questions.get(&(step + 1)) {
            Some(next) => {
                // a validator may have patched FORM_STEP to jump steps; its
                // value wins over the auto increment
                if !state.contains(FORM_STEP) || going_back {
                    state.set(FORM_STEP, step + 1);
                }
                state.set(RESPONSE_MENU_NAME, next.name.clone());
                let captured =
                    captured.as_ref().map(|(name, value)| (name.as_str(), value.as_str()));
                let text = self
                    .render_step_menu(&next.menu, context, input, lang, &state, captured)
                    .await?;
                Ok(Rendered {
                    text,
                    state,
                    valid: Some(true),
                })
            }
            None if step <= -1 => Err(NavigationError::FormBack),
            None => {
                let text = if step == self.questions.len() as i64 {
                    "END Next step not specified"
                } else {
                    "END Step response not specified"
                };
                log::warn!("{}", &text[4..]);
                Ok(Rendered {
                    text: text.to_string(),
                    state,
                    valid: Some(true),
                })
            }
        }
    }

    async fn render_step_menu(
        &self,
        menu: &StepMenu,
        context: &TurnContext,
        input: Option<&str>,
        lang: Option<&str>,
        state: &StatePatch,
        captured: Option<(&str, &str)>,
    ) -> Result<String, NavigationError> {
        match menu {
            StepMenu::Text(text) => Ok(text.resolve(lang)?.to_string()),
            StepMenu::List(list) => {
                let data = HashMap::new();
                let request = MenuRequest {
                    context,
                    input,
                    lang,
                    data: &data,
                    state,
                    scope: Scope::Menu,
                };
                list.render(&request).await
            }
            StepMenu::Producer(producer) => {
                let mut data = self.gather_data(context).await?;
                if let Some((name, value)) = captured {
                    data.insert(name.to_string(), value.to_string());
                }
                let request = MenuRequest {
                    context,
                    input,
                    lang,
                    data: &data,
                    state,
                    scope: Scope::Menu,
                };
                producer.produce(&request).await.map_err(|err| {
                    NavigationError::ImproperlyConfigured(format!("menu producer failed: {}", err))
                })
            }
        }
    }

    async fn gather_data(
        &self,
        context: &TurnContext,
    ) -> Result<HashMap<String, String>, NavigationError> {
        let mut data = HashMap::new();
        for question in self.questions.values() {
            if let Some(value) = context.session.get(&question.name).await? {
                data.insert(question.name.clone(), value);
            }
        }
        Ok(data)
    }
}

/// A single form question
pub struct FormStep {
    name: String,
    menu: StepMenu,
    post_call: Option<Arc<dyn PostCall>>,
}

impl FormStep {
    /// Creates a step capturing its input under `name`
    ///
    /// The name must be a valid identifier (letters, digits and underscores,
    /// not starting with a digit), otherwise the value is not captured.
    pub fn new<N, M>(name: N, menu: M) -> Self
    where
        N: Into<String>,
        M: Into<StepMenu>,
    {
        Self {
            name: name.into(),
            menu: menu.into(),
            post_call: None,
        }
    }

    /// Callback invoked after this step's input is captured
    pub fn post_call<P>(mut self, post_call: P) -> Self
    where
        P: PostCall + 'static,
    {
        self.post_call = Some(Arc::new(post_call));
        self
    }
}

/// The prompt shown for a form step
pub enum StepMenu {
    /// A fixed prompt, framing prefix included
    Text(Text),
    /// A numbered list of choices
    List(ListInput),
    /// A callback producing the rendered prompt
    Producer(Arc<dyn MenuProducer>),
}

impl StepMenu {
    /// Creates a prompt produced by a callback
    pub fn producer<P>(producer: P) -> Self
    where
        P: MenuProducer + 'static,
    {
        StepMenu::Producer(Arc::new(producer))
    }
}

impl From<Text> for StepMenu {
    fn from(text: Text) -> Self {
        StepMenu::Text(text)
    }
}

impl From<&str> for StepMenu {
    fn from(text: &str) -> Self {
        StepMenu::Text(Text::plain(text))
    }
}

impl From<String> for StepMenu {
    fn from(text: String) -> Self {
        StepMenu::Text(Text::plain(text))
    }
}

impl From<ListInput> for StepMenu {
    fn from(list: ListInput) -> Self {
        StepMenu::List(list)
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

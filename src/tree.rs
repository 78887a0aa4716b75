use crate::{
    context::TurnContext,
    error::NavigationError,
    form::{FormFlow, Rendered},
    handler::Condition,
    session::{StatePatch, FORM_STEP, RESPONSE_MENU_NAME},
    text::Text,
};
use futures::future::BoxFuture;
use std::{collections::HashMap, sync::Arc};

/// A node of the navigation tree
pub enum NavNode {
    /// A menu with children or a terminal form
    Menu(NavigationMenu),
    /// A branch resolved by a runtime predicate
    Conditional(ConditionalFlow),
}

impl From<NavigationMenu> for NavNode {
    fn from(menu: NavigationMenu) -> Self {
        NavNode::Menu(menu)
    }
}

impl From<ConditionalFlow> for NavNode {
    fn from(flow: ConditionalFlow) -> Self {
        NavNode::Conditional(flow)
    }
}

impl NavNode {
    pub(crate) fn ensure_well_formed(&self) -> Result<(), NavigationError> {
        match self {
            NavNode::Menu(menu) => menu.ensure_well_formed(),
            NavNode::Conditional(flow) => flow.ensure_well_formed(),
        }
    }
}

/// A menu in the navigation tree
///
/// A menu either has child menus, displayed as a numbered list where every
/// child's number is its 1-based position, or it leads into a form.
pub struct NavigationMenu {
    name: String,
    title: Text,
    children: Vec<NavigationMenu>,
    next_form: Option<FormFlow>,
}

impl NavigationMenu {
    /// Creates a new menu
    pub fn new<N, T>(name: N, title: T) -> Self
    where
        N: Into<String>,
        T: Into<Text>,
    {
        Self {
            name: name.into(),
            title: title.into(),
            children: Vec::new(),
            next_form: None,
        }
    }

    /// Appends a child menu
    pub fn child(mut self, child: NavigationMenu) -> Self {
        self.children.push(child);
        self
    }

    /// Sets the form this menu leads into
    pub fn form(mut self, form: FormFlow) -> Self {
        self.next_form = Some(form);
        self
    }

    /// Returns the name of the menu
    pub fn get_name(&self) -> &str {
        &self.name
    }

    pub(crate) fn ensure_well_formed(&self) -> Result<(), NavigationError> {
        if self.children.is_empty() && self.next_form.is_none() {
            return Err(NavigationError::Parse(format!(
                "menu '{}' needs either children or a next form",
                self.name
            )));
        }
        if !self.children.is_empty() && self.next_form.is_some() {
            return Err(NavigationError::Parse(format!(
                "menu '{}' cannot have both children and a next form",
                self.name
            )));
        }
        for child in &self.children {
            child.ensure_well_formed()?;
        }
        Ok(())
    }

    pub(crate) async fn render(
        &self,
        context: &TurnContext,
        input: Option<&str>,
        step: i64,
        lang: Option<&str>,
    ) -> Result<Rendered, NavigationError> {
        if !self.children.is_empty() {
            let mut state = StatePatch::new();
            state.clear(FORM_STEP);
            state.set(RESPONSE_MENU_NAME, self.name.to_uppercase());
            if input == Some(context.config.get_back_symbol()) {
                return Err(NavigationError::NavigationBack);
            }
            let mut lines = Vec::with_capacity(self.children.len());
            for (position, child) in self.children.iter().enumerate() {
                lines.push(format!(
                    "{}. {}",
                    position + 1,
                    child.title.resolve_title(lang)?
                ));
            }
            let text = format!(
                "CON {}:\n{}",
                self.title.resolve_title(lang)?,
                lines.join("\n")
            );
            Ok(Rendered {
                text,
                state,
                valid: None,
            })
        } else if let Some(form) = &self.next_form {
            form.respond(step, input, context, lang).await
        } else {
            Err(NavigationError::ImproperlyConfigured(format!(
                "menu '{}' needs either children or a next form",
                self.name
            )))
        }
    }
}

/// A runtime decided branch of the navigation tree
///
/// At walk time the condition is evaluated and the walk continues in the
/// subtree mapped to its result.
pub struct ConditionalFlow {
    condition: Arc<dyn Condition>,
    mapping: HashMap<String, NavigationMenu>,
}

impl ConditionalFlow {
    /// Creates a new branch
    ///
    /// # Arguments
    ///
    /// * condition - Callback deciding which subtree to serve
    pub fn new<C>(condition: C) -> Self
    where
        C: Condition + 'static,
    {
        Self {
            condition: Arc::new(condition),
            mapping: HashMap::new(),
        }
    }

    /// Maps a condition result to the subtree served for it
    pub fn branch<R: Into<String>>(mut self, result: R, menu: NavigationMenu) -> Self {
        self.mapping.insert(result.into(), menu);
        self
    }

    pub(crate) fn ensure_well_formed(&self) -> Result<(), NavigationError> {
        if self.mapping.is_empty() {
            return Err(NavigationError::Parse(
                "conditional branch has no outcomes".to_string(),
            ));
        }
        for menu in self.mapping.values() {
            menu.ensure_well_formed()?;
        }
        Ok(())
    }

    pub(crate) async fn resolve(
        &self,
        context: &TurnContext,
    ) -> Result<&NavigationMenu, NavigationError> {
        let result = self
            .condition
            .evaluate(context)
            .await
            .map_err(NavigationError::ConditionEvaluation)?;
        self.mapping
            .get(&result)
            .ok_or(NavigationError::ConditionResult(result))
    }
}

/// Walks the tree under an effective path
///
/// Consumes one token per level. A menu without children terminates the
/// walk: it is a form leaf and the remaining tokens are form inputs.
pub(crate) fn walk<'a>(
    node: &'a NavNode,
    path: Vec<String>,
    context: &'a TurnContext,
) -> BoxFuture<'a, Result<&'a NavigationMenu, NavigationError>> {
    Box::pin(async move {
        match node {
            NavNode::Menu(menu) => descend(menu, path).await,
            NavNode::Conditional(flow) => {
                let menu = flow.resolve(context).await?;
                descend(menu, path).await
            }
        }
    })
}

fn descend<'a>(
    menu: &'a NavigationMenu,
    mut path: Vec<String>,
) -> BoxFuture<'a, Result<&'a NavigationMenu, NavigationError>> {
    Box::pin(async move {
        if path.is_empty() {
            return Ok(menu);
        }
        let token = path.remove(0);
        if menu.children.is_empty() {
            return Ok(menu);
        }
        let choice = token
            .parse::<usize>()
            .ok()
            .filter(|choice| (1..=menu.children.len()).contains(choice))
            .ok_or(NavigationError::InvalidChoice)?;
        descend(&menu.children[choice - 1], path).await
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Config,
        form::FormStep,
        handler::Validation,
        session::{memory::MemoryBackend, SessionManager},
    };
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

    fn accept_all(
        _step: i64,
        _input: Option<&str>,
        _context: &TurnContext,
    ) -> Result<Validation, anyhow::Error> {
        Ok(Validation::checked(true))
    }

    fn create_tree() -> NavNode {
        NavNode::from(
            NavigationMenu::new("home", "Main menu")
                .child(
                    NavigationMenu::new("sales", "Sales").form(
                        FormFlow::new(accept_all).step(FormStep::new("Name", "CON Name?")),
                    ),
                )
                .child(
                    NavigationMenu::new("support", "Support")
                        .child(NavigationMenu::new("faq", "FAQ").form(
                            FormFlow::new(accept_all).step(FormStep::new("Q", "CON Ask away")),
                        )),
                ),
        )
    }

    fn tokens(path: &[&str]) -> Vec<String> {
        path.iter().map(|token| token.to_string()).collect()
    }

    #[tokio::test]
    async fn empty_path_yields_the_root() {
        let tree = create_tree();
        let context = create_context("");
        let menu = walk(&tree, Vec::new(), &context).await.unwrap();
        assert_eq!(menu.get_name(), "home");
    }

    #[tokio::test]
    async fn path_selects_children_by_position() {
        let tree = create_tree();
        let context = create_context("2*1");
        let menu = walk(&tree, tokens(&["2", "1"]), &context).await.unwrap();
        assert_eq!(menu.get_name(), "faq");
    }

    #[tokio::test]
    async fn leaf_consumes_the_remaining_tokens() {
        let tree = create_tree();
        let context = create_context("1*Alice");
        let menu = walk(&tree, tokens(&["1", "Alice"]), &context).await.unwrap();
        assert_eq!(menu.get_name(), "sales");
    }

    #[tokio::test]
    async fn bad_choices_fail() {
        let tree = create_tree();
        let context = create_context("9");
        for path in vec![tokens(&["9"]), tokens(&["x"]), tokens(&["0"])] {
            match walk(&tree, path, &context).await {
                Err(NavigationError::InvalidChoice) => {}
                _ => panic!("expected an invalid choice"),
            }
        }
    }

    #[tokio::test]
    async fn conditional_root_selects_a_subtree() {
        fn registered(context: &TurnContext) -> Result<String, anyhow::Error> {
            Ok(if context.msisdn == "254700000001" {
                "registered".to_string()
            } else {
                "guest".to_string()
            })
        }
        let tree = NavNode::from(
            ConditionalFlow::new(registered)
                .branch(
                    "registered",
                    NavigationMenu::new("home", "Main menu").child(
                        NavigationMenu::new("sales", "Sales").form(
                            FormFlow::new(accept_all).step(FormStep::new("Name", "CON Name?")),
                        ),
                    ),
                )
                .branch(
                    "guest",
                    NavigationMenu::new("register", "Register").form(
                        FormFlow::new(accept_all).step(FormStep::new("Name", "CON Name?")),
                    ),
                ),
        );
        let context = create_context("");
        let menu = walk(&tree, Vec::new(), &context).await.unwrap();
        assert_eq!(menu.get_name(), "home");
    }

    #[tokio::test]
    async fn unmapped_condition_result_fails() {
        fn oracle(_context: &TurnContext) -> Result<String, anyhow::Error> {
            Ok("something else".to_string())
        }
        let tree = NavNode::from(ConditionalFlow::new(oracle).branch(
            "known",
            NavigationMenu::new("home", "Main menu").form(
                FormFlow::new(accept_all).step(FormStep::new("Name", "CON Name?")),
            ),
        ));
        let context = create_context("");
        match walk(&tree, Vec::new(), &context).await {
            Err(NavigationError::ConditionResult(result)) => {
                assert_eq!(result, "something else")
            }
            _ => panic!("expected a condition result error"),
        }
    }

    #[tokio::test]
    async fn render_lists_children_with_positions() {
        let tree = create_tree();
        let context = create_context("");
        let menu = walk(&tree, Vec::new(), &context).await.unwrap();
        let rendered = menu.render(&context, Some(""), 0, None).await.unwrap();
        assert_eq!(rendered.text, "CON Main menu:\n1. Sales\n2. Support");
        assert_eq!(rendered.valid, None);
        assert!(rendered.state.contains(FORM_STEP));
    }

    #[tokio::test]
    async fn back_at_a_menu_with_children_signals_the_controller() {
        let tree = create_tree();
        let context = create_context("0");
        let menu = walk(&tree, Vec::new(), &context).await.unwrap();
        match menu.render(&context, Some("0"), 0, None).await {
            Err(NavigationError::NavigationBack) => {}
            _ => panic!("expected a navigation back signal"),
        }
    }

    #[test]
    fn malformed_trees_are_rejected() {
        let empty = NavNode::from(NavigationMenu::new("home", "Main menu"));
        assert!(empty.ensure_well_formed().is_err());

        let both = NavNode::from(
            NavigationMenu::new("home", "Main menu")
                .child(NavigationMenu::new("sales", "Sales").form(
                    FormFlow::new(accept_all).step(FormStep::new("Name", "CON Name?")),
                ))
                .form(FormFlow::new(accept_all).step(FormStep::new("Name", "CON Name?"))),
        );
        assert!(both.ensure_well_formed().is_err());

        let ok = create_tree();
        assert!(ok.ensure_well_formed().is_ok());
    }
}

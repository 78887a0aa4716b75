use crate::{
    channel::{framed_body, Channel},
    config::Config,
    context::TurnContext,
    error::NavigationError,
    handler::LanguageResolver,
    path::normalize,
    session::{
        Session, SessionError, SessionManager, FORM_STEP, LAST_SUCCESS_RESPONSE, PROCESSED_PATH,
        VALID_LAST_INPUT,
    },
    text::placeholders,
    tree::{walk, NavNode},
};
use std::sync::Arc;

/// The per turn orchestrator
///
/// Loads the session cursor, folds the raw path, walks the tree, renders the
/// resolved node and writes the session state back, recovering from the
/// back/home/invalid-choice control signals along the way.
pub struct NavigationController {
    root: NavNode,
    sessions: SessionManager,
    config: Arc<Config>,
    language: Option<Arc<dyn LanguageResolver>>,
    path_offset: usize,
}

impl NavigationController {
    /// Creates a new controller over a navigation tree
    ///
    /// Fails when the tree is malformed.
    ///
    /// # Arguments
    ///
    /// * root - Root of the navigation tree
    /// * sessions - Manager of the session store
    pub fn new<R>(root: R, sessions: SessionManager) -> Result<Self, NavigationError>
    where
        R: Into<NavNode>,
    {
        let root = root.into();
        root.ensure_well_formed()?;
        Ok(Self {
            root,
            sessions,
            config: Arc::new(Config::new()),
            language: None,
            path_offset: 0,
        })
    }

    /// Replaces the default configuration
    pub fn config(mut self, config: Config) -> Self {
        self.config = Arc::new(config);
        self
    }

    /// Enables translation through the given language resolver
    pub fn translation<L>(mut self, language: L) -> Self
    where
        L: LanguageResolver + 'static,
    {
        self.language = Some(Arc::new(language));
        self
    }

    /// Drops this many leading tokens from every path before walking
    ///
    /// Used to skip a dial shortcode that precedes the first real choice.
    pub fn path_offset(mut self, offset: usize) -> Self {
        self.path_offset = offset;
        self
    }

    /// Computes the response for one turn
    ///
    /// # Arguments
    ///
    /// * msisdn - Identity of the subscriber
    /// * session_id - Identifier of the dialog session
    /// * ussd_string - Asterisk delimited history of every input so far
    /// * channel - Channel the turn arrived on, affects response framing
    pub async fn navigate(
        &self,
        msisdn: &str,
        session_id: &str,
        ussd_string: &str,
        channel: Channel,
    ) -> Result<String, NavigationError> {
        let session = self.sessions.get_session(msisdn, session_id);
        let context = TurnContext::new(
            msisdn,
            session_id,
            ussd_string,
            session.clone(),
            self.config.clone(),
        );
        let step = match session.get(FORM_STEP).await? {
            Some(step) => step.parse::<i64>().unwrap_or(0),
            None => 0,
        };
        let mut path = self.processed_path(&session).await?;
        if !context.last_input.is_empty() {
            path.push(context.last_input.clone());
        }

        let (response, success) = match self.render_pass(&context, path, step, true).await {
            Ok(response) => (response, true),
            Err(NavigationError::FormBack) => {
                // the path token that led into the form is popped along with
                // the form cursor, then the previous menu is re-displayed
                let mut path = self.processed_path(&session).await?;
                path.pop();
                session.remove(FORM_STEP).await?;
                self.store_path(&session, &path).await?;
                (self.render_pass(&context, path, step, false).await?, true)
            }
            Err(NavigationError::NavigationBack) => {
                let path = self.processed_path(&session).await?;
                (self.render_pass(&context, path, step, false).await?, true)
            }
            Err(NavigationError::InvalidChoice) => {
                let last = session
                    .get(LAST_SUCCESS_RESPONSE)
                    .await?
                    .unwrap_or_default();
                session.set(VALID_LAST_INPUT, "0").await?;
                let response = format!(
                    "CON Invalid Choice\n{}",
                    framed_body(&last).unwrap_or("")
                );
                (response, false)
            }
            Err(err) => return Err(err),
        };

        let response = self.interpolate(&session, response).await?;
        if success {
            session
                .set(LAST_SUCCESS_RESPONSE, response.as_str())
                .await?;
        }
        log::debug!("response: {:?}", response);
        Ok(channel.format_response(response))
    }

    async fn render_pass(
        &self,
        context: &TurnContext,
        path: Vec<String>,
        step: i64,
        with_input: bool,
    ) -> Result<String, NavigationError> {
        let normalized = normalize(
            &path,
            self.config.get_back_symbol(),
            self.config.get_home_symbol(),
        );
        // the offset applies to the walk only; the full normalized path is
        // what gets persisted, so the offset survives follow-up turns
        let effective: Vec<String> = if normalized.len() >= self.path_offset {
            normalized[self.path_offset..].to_vec()
        } else {
            normalized.clone()
        };
        log::debug!("processed path: {:?}", effective);
        let menu = walk(&self.root, effective, context).await?;
        let session = &context.session;
        self.store_path(session, &normalized).await?;
        session.set(VALID_LAST_INPUT, "1").await?;
        let lang = self.resolve_language(context).await?;
        let input = if with_input {
            Some(context.last_input.as_str())
        } else {
            None
        };
        let rendered = menu.render(context, input, step, lang.as_deref()).await?;
        if rendered.valid == Some(false) {
            let len = normalized.len().saturating_sub(1);
            self.store_path(session, &normalized[..len]).await?;
        }
        session.apply(&rendered.state).await?;
        Ok(rendered.text)
    }

    async fn processed_path(&self, session: &Session) -> Result<Vec<String>, NavigationError> {
        match session.get(PROCESSED_PATH).await? {
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(path) => Ok(path),
                Err(err) => {
                    log::warn!("invalid processed path in the session store: {}", err);
                    Ok(Vec::new())
                }
            },
            None => Ok(Vec::new()),
        }
    }

    async fn store_path(
        &self,
        session: &Session,
        path: &[String],
    ) -> Result<(), NavigationError> {
        let encoded = serde_json::to_string(path).map_err(SessionError::Serialize)?;
        session.set(PROCESSED_PATH, encoded).await?;
        Ok(())
    }

    async fn resolve_language(
        &self,
        context: &TurnContext,
    ) -> Result<Option<String>, NavigationError> {
        let resolver = match &self.language {
            Some(resolver) => resolver,
            None => return Ok(None),
        };
        let lang = resolver.resolve(context).await.map_err(|err| {
            NavigationError::Translation(format!("language resolver failed: {}", err))
        })?;
        if lang.is_empty() {
            return Err(NavigationError::Translation(
                "language resolver returned an empty language".to_string(),
            ));
        }
        Ok(Some(lang))
    }

    async fn interpolate(
        &self,
        session: &Session,
        response: String,
    ) -> Result<String, NavigationError> {
        let names = placeholders(&response);
        if names.is_empty() {
            return Ok(response);
        }
        let mut interpolated = response;
        for name in names {
            let value = session.get(&name).await?.unwrap_or_default();
            interpolated = interpolated.replace(&format!("{{{}}}", name), &value);
        }
        Ok(interpolated)
    }
}

//! Expert consultant pipeline
//!
//! fetch → refine → evaluate, each step a separate completion on its own
//! credential pool and each consuming the previous step's output.

use super::client::{empty_on_transient, ResilientClient, UsageContext};
use crate::models::{ActionKind, ChatHistoryEntry, CompletionRequest, ModelCatalog, ModelName, Persona, Reference};
use crate::storage::{history_context, references_context, ChatHistory, PersonaStore};
use crate::utils::error::{AppError, AppResult};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// One user question
#[derive(Debug, Clone)]
pub struct ConsultRequest {
    pub user_input: String,
    pub user_prompt: String,
    pub model: ModelName,
    pub temperature: f32,
    /// Title of a stored persona; `None` asks the model to describe one
    pub persona: Option<String>,
    pub references: Vec<Reference>,
    pub interaction_number: u32,
}

impl ConsultRequest {
    pub fn new(user_input: impl Into<String>, model: ModelName) -> Self {
        Self {
            user_input: user_input.into(),
            user_prompt: String::new(),
            model,
            temperature: 0.5,
            persona: None,
            references: Vec::new(),
            interaction_number: 1,
        }
    }

    fn usage_context(&self, persona: Option<&Persona>) -> UsageContext {
        UsageContext {
            interaction_number: self.interaction_number,
            user_input: self.user_input.clone(),
            user_prompt: self.user_prompt.clone(),
            agent_used: persona.map(|p| p.title.clone()).unwrap_or_default(),
            agent_description: persona.map(|p| p.description.clone()).unwrap_or_default(),
        }
    }
}

/// Persona and the answer it gave
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub persona: Persona,
    pub response: String,
}

/// Which optional steps to run after fetch
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsultOptions {
    pub refine: bool,
    pub evaluate: bool,
}

/// Output of a full interaction
#[derive(Debug, Clone)]
pub struct Consultation {
    pub answer: Answer,
    pub refined: Option<String>,
    pub evaluation: Option<String>,
}

pub struct Consultant {
    client: ResilientClient,
    personas: PersonaStore,
    history: ChatHistory,
    catalog: ModelCatalog,
}

impl Consultant {
    pub fn new(client: ResilientClient, personas: PersonaStore, history: ChatHistory, catalog: ModelCatalog) -> Self {
        Self {
            client,
            personas,
            history,
            catalog,
        }
    }

    pub fn client(&self) -> &ResilientClient {
        &self.client
    }

    pub fn personas(&self) -> &PersonaStore {
        &self.personas
    }

    pub fn history(&self) -> &ChatHistory {
        &self.history
    }

    fn completion(&self, req: &ConsultRequest, prompt: String) -> CompletionRequest {
        CompletionRequest::new(prompt, req.model.clone())
            .with_temperature(req.temperature)
            .with_catalog(&self.catalog)
    }

    async fn ask(
        &self,
        req: &ConsultRequest,
        action: ActionKind,
        prompt: String,
        persona: Option<&Persona>,
        cancel: &CancellationToken,
    ) -> AppResult<String> {
        let request = self.completion(req, prompt);
        let context = req.usage_context(persona);
        empty_on_transient(
            self.client
                .complete_cancellable(&request, action, &context, cancel)
                .await,
        )
    }

    /// Run fetch and whichever optional steps are enabled
    pub async fn consult(
        &self,
        req: &ConsultRequest,
        options: ConsultOptions,
        cancel: &CancellationToken,
    ) -> AppResult<Consultation> {
        let answer = self.fetch(req, cancel).await?;

        let refined = if options.refine {
            Some(self.refine(req, &answer, cancel).await?)
        } else {
            None
        };

        let evaluation = if options.evaluate {
            Some(self.evaluate(req, &answer, cancel).await?)
        } else {
            None
        };

        Ok(Consultation {
            answer,
            refined,
            evaluation,
        })
    }

    /// Resolve the persona, answer as it, and record the exchange in chat history
    pub async fn fetch(&self, req: &ConsultRequest, cancel: &CancellationToken) -> AppResult<Answer> {
        let persona = match &req.persona {
            Some(title) => self
                .personas
                .find(title)?
                .ok_or_else(|| AppError::NotFound(format!("persona '{}'", title)))?,
            None => self.synthesize_persona(req, cancel).await?,
        };

        let history = self.history.load()?;
        let prompt = format!(
            "{}, answer the following request completely and in detail: {} {}\n\nChat history:{}\n\nReferences:\n{}",
            persona.title,
            req.user_input,
            req.user_prompt,
            history_context(&history),
            references_context(&req.references),
        );

        let response = self.ask(req, ActionKind::Fetch, prompt, Some(&persona), cancel).await?;

        if !response.is_empty() {
            self.history.append(ChatHistoryEntry {
                user_input: req.user_input.clone(),
                user_prompt: req.user_prompt.clone(),
                expert_response: response.clone(),
            })?;
        }

        Ok(Answer { persona, response })
    }

    async fn synthesize_persona(&self, req: &ConsultRequest, cancel: &CancellationToken) -> AppResult<Persona> {
        let prompt = format!(
            "Describe the ideal expert to answer the following request: {} {}. \
             Start with the expert's title followed by a period, then describe their background and experience.",
            req.user_input, req.user_prompt,
        );

        let text = self.ask(req, ActionKind::Fetch, prompt, None, cancel).await?;
        let persona = Persona::from_synthesized(&text);

        if persona.title.is_empty() {
            warn!("Persona synthesis returned no title, answering without a stored persona");
        } else {
            info!("Synthesized persona: {}", persona.title);
            self.personas.save(persona.clone())?;
        }

        Ok(persona)
    }

    /// Second pass over the fetched answer
    pub async fn refine(&self, req: &ConsultRequest, answer: &Answer, cancel: &CancellationToken) -> AppResult<String> {
        let history = self.history.load()?;
        let mut prompt = format!(
            "{}, refine the following answer: {}\n\nOriginal request: {} {}\n\nChat history:{}",
            answer.persona.title,
            answer.response,
            req.user_input,
            req.user_prompt,
            history_context(&history),
        );

        if req.references.is_empty() {
            prompt.push_str(
                "\n\nNo references were provided, so make sure the answer is detailed and accurate without external sources.",
            );
        } else {
            prompt.push_str("\n\nReferences:\n");
            prompt.push_str(&references_context(&req.references));
        }

        self.ask(req, ActionKind::Refine, prompt, Some(&answer.persona), cancel).await
    }

    /// Critical evaluation of the fetched answer against the persona
    pub async fn evaluate(&self, req: &ConsultRequest, answer: &Answer, cancel: &CancellationToken) -> AppResult<String> {
        let prompt = format!(
            "Act as a rational evaluator. The expert is described as: {}\n\n\
             Original question: {} {}\n\n\
             Expert answer: {}\n\n\
             Assess the quality and accuracy of the answer given the expert's description. \
             Provide a SWOT analysis, a risk matrix, and point out any gaps in the reasoning.",
            answer.persona.description,
            req.user_input,
            req.user_prompt,
            answer.response,
        );

        self.ask(req, ActionKind::Evaluate, prompt, Some(&answer.persona), cancel).await
    }
}

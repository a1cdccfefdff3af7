use crate::core::config::BackendConfig;
use crate::core::pipeline::Stage;
use crate::core::state::{Progress, Step, WorkflowState};
use crate::core::view::{AudioView, EnhancementView, GalleryView, OutputView, PromptCard};
use crate::services::backend::HttpBackend;
use crate::services::workflow::WorkflowController;
use crate::ui::{html, Notice, Renderer, NOTICE_TTL};
use leptos::*;
use std::cell::RefCell;
use std::rc::Rc;

/// Reactive state the page is drawn from. Every field is a `Copy` handle.
#[derive(Clone, Copy)]
struct PageSignals {
    step: RwSignal<Step>,
    progress: RwSignal<Progress>,
    loading: RwSignal<bool>,
    /// A request is running; every control is disabled until it returns.
    busy: RwSignal<bool>,
    notices: RwSignal<Vec<(u64, Notice)>>,
    next_notice: RwSignal<u64>,
    armed: RwSignal<Vec<Stage>>,
    enhancement: RwSignal<Option<EnhancementView>>,
    prompts: RwSignal<String>,
    gallery: RwSignal<String>,
    audio: RwSignal<String>,
    output: RwSignal<String>,
}

impl PageSignals {
    fn new() -> Self {
        let state = WorkflowState::default();
        Self {
            step: create_rw_signal(state.current_step()),
            progress: create_rw_signal(state.progress()),
            loading: create_rw_signal(false),
            busy: create_rw_signal(false),
            notices: create_rw_signal(Vec::new()),
            next_notice: create_rw_signal(0),
            armed: create_rw_signal(Vec::new()),
            enhancement: create_rw_signal(None),
            prompts: create_rw_signal(String::new()),
            gallery: create_rw_signal(String::new()),
            audio: create_rw_signal(String::new()),
            output: create_rw_signal(String::new()),
        }
    }
}

struct SignalRenderer {
    signals: PageSignals,
}

impl Renderer for SignalRenderer {
    fn show_step(&self, step: Step) {
        self.signals.step.set(step);
    }

    fn update_progress(&self, progress: &Progress) {
        self.signals.progress.set(progress.clone());
    }

    fn set_loading(&self, loading: bool) {
        self.signals.loading.set(loading);
    }

    fn alert(&self, message: &str) {
        let _ = window().alert_with_message(message);
    }

    fn notify(&self, notice: &Notice) {
        let id = self.signals.next_notice.get_untracked();
        self.signals.next_notice.set(id + 1);
        self.signals
            .notices
            .update(|notices| notices.push((id, notice.clone())));

        let notices = self.signals.notices;
        set_timeout(
            move || notices.update(|list| list.retain(|(i, _)| *i != id)),
            NOTICE_TTL,
        );
    }

    fn set_action_enabled(&self, stage: Stage, enabled: bool) {
        self.signals.armed.update(|armed| {
            armed.retain(|s| *s != stage);
            if enabled {
                armed.push(stage);
            }
        });
    }

    fn render_enhancement(&self, view: &EnhancementView) {
        self.signals.enhancement.set(Some(view.clone()));
    }

    fn render_prompts(&self, cards: &[PromptCard]) {
        self.signals.prompts.set(html::prompts(cards));
    }

    fn render_gallery(&self, view: &GalleryView) {
        self.signals.gallery.set(html::gallery(view));
    }

    fn render_audio(&self, view: &AudioView) {
        self.signals.audio.set(html::audio(view));
    }

    fn render_output(&self, view: &OutputView) {
        self.signals.output.set(html::output(view));
    }
}

#[derive(Debug, Clone, Copy)]
enum UiAction {
    LoadStatus,
    Toggle(bool),
    Run(Stage),
}

#[component]
pub fn App() -> impl IntoView {
    let signals = PageSignals::new();
    let origin = window().location().origin().unwrap_or_default();

    let controller = HttpBackend::new(&BackendConfig { base_url: origin }).map(|backend| {
        WorkflowController::new(Box::new(backend), Box::new(SignalRenderer { signals }))
    });

    view! {
        <div class="container">
            <h1>"Teaching Video Generator"</h1>
            {match controller {
                Ok(ctl) => view! { <Workflow controller=ctl signals=signals/> }.into_view(),
                Err(e) => view! { <p class="error">"Cannot reach the generator: " {e.to_string()}</p> }.into_view(),
            }}
        </div>
    }
}

#[component]
fn Workflow(controller: WorkflowController, signals: PageSignals) -> impl IntoView {
    let (script, set_script) = create_signal(String::new());

    // Taken out while a request runs; `busy` disables the controls until it is back.
    let slot = Rc::new(RefCell::new(Some(controller)));
    let run = Callback::new(move |action: UiAction| {
        let slot = slot.clone();
        let script = script.get_untracked();
        spawn_local(async move {
            let Some(mut ctl) = slot.borrow_mut().take() else {
                log::debug!("Ignoring {:?} while another request is running", action);
                return;
            };
            signals.busy.set(true);
            match action {
                UiAction::LoadStatus => ctl.load_status().await,
                UiAction::Toggle(use_groq) => {
                    let _ = ctl.toggle_enhancement(use_groq).await;
                }
                UiAction::Run(stage) => {
                    let _ = ctl.run_stage(stage, &script).await;
                }
            }
            *slot.borrow_mut() = Some(ctl);
            signals.busy.set(false);
        });
    });

    create_effect(move |_| run.call(UiAction::LoadStatus));

    view! {
        <div class="progress-container">
            <div class="progress-bar">
                <div class="progress-fill" style:width=move || format!("{}%", signals.progress.get().percentage)></div>
            </div>
            <p class="progress-text">{move || signals.progress.get().label}</p>
        </div>

        <div class="enhancement-panel">
            <label class="toggle">
                <input
                    type="checkbox"
                    prop:checked=move || signals.enhancement.get().map(|e| e.enabled).unwrap_or(false)
                    disabled=move || signals.busy.get()
                    on:change=move |ev| run.call(UiAction::Toggle(event_target_checked(&ev)))
                />
                <span>"Advanced AI analysis"</span>
            </label>
            {move || signals.enhancement.get().map(|view| html::enhancement(&view)).map(|markup| view! { <div inner_html=markup></div> })}
        </div>

        <StepPanel step=Step::Script current=signals.step>
            <textarea
                class="script-input"
                placeholder="Paste your teaching script here..."
                prop:value=move || script.get()
                on:input=move |ev| set_script.set(event_target_value(&ev))
            ></textarea>
            <ActionButton stage=Stage::SplitScript armed=signals.armed busy=signals.busy run=run/>
            <ActionButton stage=Stage::GeneratePrompts armed=signals.armed busy=signals.busy run=run/>
        </StepPanel>

        <StepPanel step=Step::Prompts current=signals.step>
            <div id="prompts-container" inner_html=move || signals.prompts.get()></div>
            <ActionButton stage=Stage::GenerateImages armed=signals.armed busy=signals.busy run=run/>
        </StepPanel>

        <StepPanel step=Step::Images current=signals.step>
            <div id="images-container" inner_html=move || signals.gallery.get()></div>
            <ActionButton stage=Stage::GenerateAudio armed=signals.armed busy=signals.busy run=run/>
        </StepPanel>

        <StepPanel step=Step::Audio current=signals.step>
            <div id="audio-container" inner_html=move || signals.audio.get()></div>
            <ActionButton stage=Stage::CreateVideo armed=signals.armed busy=signals.busy run=run/>
        </StepPanel>

        <StepPanel step=Step::Video current=signals.step>
            <div id="output-container" inner_html=move || signals.output.get()></div>
        </StepPanel>

        <Show when=move || signals.loading.get()>
            <div class="loading-overlay"><div class="spinner"></div><p>"Processing..."</p></div>
        </Show>

        <div class="notifications">
            <For
                each=move || signals.notices.get()
                key=|(id, _)| *id
                children=move |(_, notice)| view! { <div class=notice.level.css_class()>{notice.message}</div> }
            />
        </div>
    }
}

#[component]
fn StepPanel(step: Step, current: RwSignal<Step>, children: Children) -> impl IntoView {
    view! {
        <section
            id=step.panel_id()
            class="step-panel"
            class:active=move || step.is_shown_on(current.get())
            style:display=move || if step.is_shown_on(current.get()) { "block" } else { "none" }
        >
            <h2>{format!("Step {}: {}", step.number(), step.title())}</h2>
            {children()}
        </section>
    }
}

#[component]
fn ActionButton(
    stage: Stage,
    armed: RwSignal<Vec<Stage>>,
    busy: RwSignal<bool>,
    run: Callback<UiAction>,
) -> impl IntoView {
    view! {
        <button
            class="btn"
            disabled=move || busy.get() || !armed.get().contains(&stage)
            on:click=move |_| run.call(UiAction::Run(stage))
        >
            {stage.name()}
        </button>
    }
}

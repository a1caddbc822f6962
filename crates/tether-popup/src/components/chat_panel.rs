use std::cell::RefCell;
use std::rc::Rc;

use chrono::{Local, Utc};
use tether_core::chat::{ChatAction, ChatLaunch, ChatRole, Transcript};
use tether_core::config::ChatSettings;
use web_sys::{HtmlInputElement, SubmitEvent};
use yew::{
    Callback, Html, Properties, TargetCast, classes, function_component, html, use_effect_with,
    use_force_update, use_mut_ref, use_state,
};

use crate::api::interact;
use crate::app::ui_debug;

#[derive(Properties, PartialEq)]
pub struct ChatPanelProps {
    pub launch: ChatLaunch,
    pub settings: ChatSettings,
    pub on_switch: Callback<()>,
    pub on_sign_out: Callback<()>,
}

/// Sends `action` to the runtime and appends the outcome, unless the
/// panel was relaunched for another organization in the meantime.
fn exchange(
    launch: ChatLaunch,
    settings: ChatSettings,
    action: ChatAction,
    transcript: Rc<RefCell<Transcript>>,
    epoch: Rc<RefCell<u64>>,
    on_done: Callback<()>,
) {
    let started_in = *epoch.borrow();
    let request = launch.interact_request(&settings, &action);
    wasm_bindgen_futures::spawn_local(async move {
        let outcome = interact(&request).await;
        if *epoch.borrow() != started_in {
            tracing::debug!("dropping chat reply for a previous organization");
            return;
        }
        match outcome {
            Ok(replies) => transcript.borrow_mut().push_replies(replies, Utc::now()),
            Err(error) => {
                tracing::warn!(%error, organization = %launch.organization_id, "chat request failed");
                transcript.borrow_mut().push_error(Utc::now());
            }
        }
        on_done.emit(());
    });
}

#[function_component(ChatPanel)]
pub fn chat_panel(props: &ChatPanelProps) -> Html {
    let transcript = use_mut_ref(Transcript::new);
    let epoch = use_mut_ref(|| 0u64);
    let draft = use_state(String::new);
    let busy = use_state(|| false);
    let trigger = use_force_update();

    let on_done = {
        let busy = busy.clone();
        let trigger = trigger.clone();
        Callback::from(move |()| {
            busy.set(false);
            trigger.force_update();
        })
    };

    {
        let transcript = transcript.clone();
        let epoch = epoch.clone();
        let busy = busy.clone();
        let settings = props.settings.clone();
        let on_done = on_done.clone();
        use_effect_with(props.launch.clone(), move |launch| {
            *epoch.borrow_mut() += 1;
            *transcript.borrow_mut() = Transcript::new();
            busy.set(true);
            ui_debug("chat.launch", &launch.organization_id);
            exchange(
                launch.clone(),
                settings,
                ChatAction::Launch,
                transcript,
                epoch,
                on_done,
            );
        });
    }

    let on_input = {
        let draft = draft.clone();
        Callback::from(move |event: yew::InputEvent| {
            let input: HtmlInputElement = event.target_unchecked_into();
            draft.set(input.value());
        })
    };

    let on_send = {
        let launch = props.launch.clone();
        let settings = props.settings.clone();
        let transcript = transcript.clone();
        let epoch = epoch.clone();
        let draft = draft.clone();
        let busy = busy.clone();
        let trigger = trigger.clone();
        Callback::from(move |event: SubmitEvent| {
            event.prevent_default();
            if *busy {
                return;
            }
            let Some(text) = transcript.borrow_mut().push_user(&draft, Utc::now()) else {
                return;
            };
            draft.set(String::new());
            busy.set(true);
            trigger.force_update();
            exchange(
                launch.clone(),
                settings.clone(),
                ChatAction::Text(text),
                transcript.clone(),
                epoch.clone(),
                on_done.clone(),
            );
        })
    };

    let on_switch = props.on_switch.clone();
    let on_sign_out = props.on_sign_out.clone();
    let transcript = transcript.borrow();

    html! {
        <div class="card chat">
            <div class="chat-header">
                <span class="header">{ &props.launch.organization_name }</span>
                <div class="actions">
                    <button class="btn" onclick={move |_| on_switch.emit(())}>{ "Switch Organization" }</button>
                    <button class="btn danger" onclick={move |_| on_sign_out.emit(())}>{ "Sign Out" }</button>
                </div>
            </div>

            <div class="messages">
                {
                    for transcript.messages().iter().map(|message| {
                        let role = match message.role {
                            ChatRole::User => "user",
                            ChatRole::Assistant => "assistant",
                        };
                        html! {
                            <div class={classes!("message", role)}>
                                <div class="content">{ &message.content }</div>
                                <div class="time">
                                    { message.at.with_timezone(&Local).format("%H:%M").to_string() }
                                </div>
                            </div>
                        }
                    })
                }
                {
                    if *busy {
                        html! { <div class="message assistant typing">{ "..." }</div> }
                    } else {
                        html! {}
                    }
                }
            </div>

            <form class="composer" onsubmit={on_send}>
                <input
                    type="text"
                    placeholder="Type your message..."
                    value={(*draft).clone()}
                    oninput={on_input}
                    disabled={*busy}
                />
                <button type="submit" class="btn primary" disabled={*busy || draft.trim().is_empty()}>
                    { "Send" }
                </button>
            </form>
        </div>
    }
}

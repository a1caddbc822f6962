use tether_core::form::{
    AuthMode, LoginDraft, PENDING_VERIFICATION_NOTICE, RESET_SENT_NOTICE,
};
use tether_core::session::SignUpOutcome;
use web_sys::{HtmlInputElement, SubmitEvent};
use yew::{
    Callback, Html, Properties, TargetCast, classes, function_component, html, use_state,
};

use super::AuthHandle;
use crate::app::ui_debug;

#[derive(Properties, PartialEq)]
pub struct LoginFormProps {
    pub auth: AuthHandle,
}

/// Sign-in and sign-up share one form; a successful sign-in reaches the
/// rest of the popup through the auth state listener.
#[function_component(LoginForm)]
pub fn login_form(props: &LoginFormProps) -> Html {
    let draft = use_state(LoginDraft::default);
    let busy = use_state(|| false);
    let error = use_state(|| None::<String>);
    let notice = use_state(|| None::<String>);

    let set_mode = |mode: AuthMode| {
        let draft = draft.clone();
        let error = error.clone();
        let notice = notice.clone();
        Callback::from(move |_: yew::MouseEvent| {
            let mut next = (*draft).clone();
            next.switch_mode(mode);
            draft.set(next);
            error.set(None);
            notice.set(None);
        })
    };

    let on_email = {
        let draft = draft.clone();
        Callback::from(move |event: yew::InputEvent| {
            let input: HtmlInputElement = event.target_unchecked_into();
            let mut next = (*draft).clone();
            next.email = input.value();
            draft.set(next);
        })
    };

    let on_password = {
        let draft = draft.clone();
        Callback::from(move |event: yew::InputEvent| {
            let input: HtmlInputElement = event.target_unchecked_into();
            let mut next = (*draft).clone();
            next.password = input.value();
            draft.set(next);
        })
    };

    let on_terms = {
        let draft = draft.clone();
        Callback::from(move |event: yew::Event| {
            let input: HtmlInputElement = event.target_unchecked_into();
            let mut next = (*draft).clone();
            next.agreed_to_terms = input.checked();
            draft.set(next);
        })
    };

    let on_submit = {
        let auth = props.auth.clone();
        let draft = draft.clone();
        let busy = busy.clone();
        let error = error.clone();
        let notice = notice.clone();
        Callback::from(move |event: SubmitEvent| {
            event.prevent_default();
            if *busy {
                return;
            }
            let credentials = match draft.credentials() {
                Ok(credentials) => credentials,
                Err(form_error) => {
                    error.set(Some(form_error.to_string()));
                    return;
                }
            };

            error.set(None);
            notice.set(None);
            busy.set(true);
            ui_debug("form.auth.submit", &format!("{:?}", draft.mode));

            let auth = auth.get();
            let mode = draft.mode;
            let draft = draft.clone();
            let busy = busy.clone();
            let error = error.clone();
            let notice = notice.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let outcome = match mode {
                    AuthMode::SignIn => auth.sign_in(&credentials).await.map(|_| None),
                    AuthMode::SignUp => auth.sign_up(&credentials).await.map(|outcome| {
                        match outcome {
                            SignUpOutcome::SignedIn(_) => None,
                            SignUpOutcome::PendingVerification => {
                                Some(PENDING_VERIFICATION_NOTICE.to_string())
                            }
                        }
                    }),
                };
                busy.set(false);
                match outcome {
                    Ok(Some(message)) => {
                        let mut next = (*draft).clone();
                        next.switch_mode(AuthMode::SignIn);
                        draft.set(next);
                        notice.set(Some(message));
                    }
                    Ok(None) => {}
                    Err(auth_error) => {
                        tracing::warn!(error = %auth_error, "authentication failed");
                        error.set(Some(auth_error.user_message()));
                    }
                }
            });
        })
    };

    let on_forgot = {
        let auth = props.auth.clone();
        let draft = draft.clone();
        let error = error.clone();
        let notice = notice.clone();
        Callback::from(move |_: yew::MouseEvent| {
            let email = match draft.reset_email() {
                Ok(email) => email,
                Err(form_error) => {
                    error.set(Some(form_error.to_string()));
                    return;
                }
            };
            ui_debug("button.forgot_password.click", "requesting reset email");

            let auth = auth.get();
            let error = error.clone();
            let notice = notice.clone();
            wasm_bindgen_futures::spawn_local(async move {
                match auth.reset_password_for_email(&email).await {
                    Ok(()) => {
                        error.set(None);
                        notice.set(Some(RESET_SENT_NOTICE.to_string()));
                    }
                    Err(auth_error) => {
                        tracing::warn!(error = %auth_error, "password reset request failed");
                        error.set(Some(auth_error.user_message()));
                    }
                }
            });
        })
    };

    let signing_up = draft.mode == AuthMode::SignUp;

    html! {
        <div class="card login">
            <div class="tabs">
                <button
                    class={classes!("tab", (!signing_up).then_some("active"))}
                    onclick={set_mode(AuthMode::SignIn)}
                >
                    { "Sign In" }
                </button>
                <button
                    class={classes!("tab", signing_up.then_some("active"))}
                    onclick={set_mode(AuthMode::SignUp)}
                >
                    { "Sign Up" }
                </button>
            </div>

            <form onsubmit={on_submit}>
                <label class="field">
                    <span>{ "Email" }</span>
                    <input
                        type="email"
                        autocomplete="email"
                        value={draft.email.clone()}
                        oninput={on_email}
                        disabled={*busy}
                    />
                </label>
                <label class="field">
                    <span>{ "Password" }</span>
                    <input
                        type="password"
                        autocomplete={if signing_up { "new-password" } else { "current-password" }}
                        value={draft.password.clone()}
                        oninput={on_password}
                        disabled={*busy}
                    />
                </label>

                {
                    if signing_up {
                        html! {
                            <label class="terms">
                                <input
                                    type="checkbox"
                                    checked={draft.agreed_to_terms}
                                    onchange={on_terms}
                                    disabled={*busy}
                                />
                                <span>{ "I agree to the Terms of Service and Privacy Policy" }</span>
                            </label>
                        }
                    } else {
                        html! {
                            <button type="button" class="link" onclick={on_forgot} disabled={*busy}>
                                { "Forgot password?" }
                            </button>
                        }
                    }
                }

                {
                    if let Some(message) = (*error).clone() {
                        html! { <div class="error-text">{ message }</div> }
                    } else {
                        html! {}
                    }
                }
                {
                    if let Some(message) = (*notice).clone() {
                        html! { <div class="notice">{ message }</div> }
                    } else {
                        html! {}
                    }
                }

                <button type="submit" class="btn primary" disabled={*busy}>
                    { draft.submit_label(*busy) }
                </button>
            </form>
        </div>
    }
}

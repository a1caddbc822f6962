use gloo::net::http::RequestBuilder;
use serde::Serialize;
use tether_core::chat::{
  InteractRequest,
  parse_traces,
  reply_messages
};
use tracing::debug;

/// Status and body of a completed HTTP exchange.
pub struct Reply {
  pub status: u16,
  pub body:   String
}

impl Reply {
  pub fn is_success(&self) -> bool {
    (200..300).contains(&self.status)
  }
}

/// Sends `builder`, with `body` as JSON when given, and reads the whole
/// response as text. `Err` only for transport failures.
pub async fn send<B>(
  builder: RequestBuilder,
  body: Option<&B>
) -> Result<Reply, String>
where
  B: Serialize + ?Sized,
{
  let request = match body {
    | Some(body) => builder.json(body),
    | None => builder.build()
  }
  .map_err(|e| {
    format!("failed to build request: {e}")
  })?;

  let response =
    request.send().await.map_err(|e| {
      format!("request failed: {e}")
    })?;
  let status = response.status();
  let body =
    response.text().await.map_err(|e| {
      format!(
        "failed to read response: {e}"
      )
    })?;

  debug!(
    url = %response.url(),
    status,
    "http exchange finished"
  );
  Ok(Reply { status, body })
}

/// Posts one interaction to the chat runtime and returns the assistant
/// replies it produced.
pub async fn interact(
  request: &InteractRequest
) -> Result<Vec<String>, String> {
  let builder = request
    .headers
    .iter()
    .fold(
      gloo::net::http::Request::post(
        &request.url
      ),
      |builder, (name, value)| {
        builder.header(name, value)
      }
    );

  let reply =
    send(builder, Some(&request.body))
      .await?;
  if !reply.is_success() {
    return Err(format!(
      "chat runtime returned status {}",
      reply.status
    ));
  }

  let traces = parse_traces(&reply.body)
    .map_err(|e| {
      format!(
        "unexpected chat runtime \
         response: {e}"
      )
    })?;
  Ok(reply_messages(&traces))
}

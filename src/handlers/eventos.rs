// src/handlers/eventos.rs

use std::convert::Infallible;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use tokio_stream::{wrappers::BroadcastStream, Stream, StreamExt};

use crate::{
    config::AppState,
    middleware::obra::ObraContext,
    models::{evento::EventoAlteracao, obra::Obra},
    services::eventos::interessa,
};

/// Converte um evento do canal em evento SSE, descartando os de outra obra.
///
/// Se o assinante ficou para trás, emite "resync" para o cliente recarregar tudo.
fn para_sse(
    recebido: Result<EventoAlteracao, tokio_stream::wrappers::errors::BroadcastStreamRecvError>,
    obra: Obra,
) -> Option<Event> {
    match recebido {
        Ok(evento) if interessa(&evento, obra) => {
            Event::default().event("alteracao").json_data(&evento).ok()
        }
        Ok(_) => None,
        Err(e) => {
            tracing::warn!(obra = %obra, "Assinante de eventos atrasado: {}", e);
            Some(Event::default().event("resync").data("{}"))
        }
    }
}

// GET /api/eventos
#[utoipa::path(
    get,
    path = "/api/eventos",
    tag = "Eventos",
    responses((status = 200, description = "Fluxo SSE de alterações da obra", content_type = "text/event-stream")),
    params(("x-obra" = String, Header, description = "Obra: masters ou honda")),
    security(("api_jwt" = []))
)]
pub async fn stream_eventos(
    State(app_state): State<AppState>,
    ObraContext(obra): ObraContext,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = app_state.notificador.assinar();
    tracing::debug!(obra = %obra, "Novo assinante de eventos");

    let stream = BroadcastStream::new(rx)
        .filter_map(move |recebido| para_sse(recebido, obra))
        .map(Ok);

    Sse::new(stream).keep_alive(KeepAlive::default())
}

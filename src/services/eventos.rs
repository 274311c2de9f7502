// src/services/eventos.rs

use tokio::sync::broadcast;

use crate::models::{
    evento::{Acao, EventoAlteracao, Tabela},
    obra::Obra,
};

/// Canal de notificação de alterações, publicado após cada escrita bem-sucedida.
#[derive(Clone)]
pub struct Notificador {
    tx: broadcast::Sender<EventoAlteracao>,
}

impl Notificador {
    pub fn new(capacidade: usize) -> Self {
        let (tx, _) = broadcast::channel(capacidade.max(1));
        Self { tx }
    }

    pub fn publicar(&self, obra: Option<Obra>, tabela: Tabela, acao: Acao) {
        let evento = EventoAlteracao { obra, tabela, acao };
        // Sem assinantes o envio falha, e tudo bem
        if self.tx.send(evento).is_err() {
            tracing::trace!(?tabela, "Nenhum assinante para o evento");
        }
    }

    pub fn assinar(&self) -> broadcast::Receiver<EventoAlteracao> {
        self.tx.subscribe()
    }
}

/// Um evento interessa à obra se for dela ou se não pertencer a nenhuma.
pub fn interessa(evento: &EventoAlteracao, obra: Obra) -> bool {
    evento.obra.is_none_or(|o| o == obra)
}

pub mod auth;
pub mod colaborador_service;
pub mod estoque_service;
pub mod eventos;
pub mod exportacao;
pub mod ferramenta_service;
pub mod relatorio_service;
pub mod requisicao_service;

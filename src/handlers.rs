pub mod auth;
pub mod colaboradores;
pub mod estoque;
pub mod eventos;
pub mod ferramentas;
pub mod relatorios;
pub mod requisicoes;

mod admin;
mod broadcast;
mod convocatorias;
mod correcciones;
mod health_check;
mod helpers;
mod monitoring;

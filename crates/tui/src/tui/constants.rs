use std::time::Duration;

pub(crate) const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
pub(crate) const TICK_RATE: Duration = Duration::from_millis(100);
pub(crate) const STATUS_TTL: Duration = Duration::from_secs(5);

pub(crate) const STATUS_LOOKUP: &str = "Buscando usuario…";
pub(crate) const STATUS_SAVING: &str = "Guardando tarea…";
pub(crate) const STATUS_DELETING: &str = "Eliminando tarea…";
pub(crate) const STATUS_REFRESHING: &str = "Sincronizando tareas…";
pub(crate) const STATUS_REFRESHED: &str = "Tareas sincronizadas";
pub(crate) const STATUS_ENTER_EDIT: &str =
    "Editando tarea • Enter guarda • Esc cancela";
pub(crate) const STATUS_EDIT_CANCELLED: &str = "Edición cancelada";
pub(crate) const STATUS_UNCHANGED: &str = "Sin cambios";
pub(crate) const STATUS_FIX_FIELDS: &str = "Revisa los campos marcados";
pub(crate) const STATUS_DISABLED: &str = "Primero ingresa un documento registrado y presiona Enter";
pub(crate) const STATUS_LOCKED: &str = "El usuario no se puede cambiar al editar una tarea";
pub(crate) const STATUS_NO_CARDS: &str = "No hay tareas";
pub(crate) const STATUS_HELP: &str = "Atajos de teclado • Enter/Esc cierra";
pub(crate) const STATUS_CONFIRM_DELETE: &str =
    "Confirmar eliminación • ←/→ elige • Enter confirma • Esc cancela";

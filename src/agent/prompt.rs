//! The analyst system instruction and fixed user-facing strings.

/// Fully-qualified BigQuery table holding the trip data.
pub const TABLE_NAME: &str = "bigquery-public-data.new_york_citibike.citibike_trips";

/// Table schema presented to the model, in BigQuery DDL form.
const TABLE_SCHEMA: &str = "\
CREATE TABLE `bigquery-public-data.new_york_citibike.citibike_trips` (
    tripduration INTEGER,
    starttime TIMESTAMP,
    stoptime TIMESTAMP,
    start_station_id INTEGER,
    start_station_name STRING,
    start_station_latitude FLOAT64,
    start_station_longitude FLOAT64,
    end_station_id INTEGER,
    end_station_name STRING,
    end_station_latitude FLOAT64,
    end_station_longitude FLOAT64,
    bikeid INTEGER,
    usertype STRING,
    birth_year INTEGER,
    gender STRING,
    customer_plan STRING
)";

/// Sample questions surfaced in channel greetings.
pub const EXAMPLE_QUESTIONS: &[&str] = &[
    "¿Cuántos viajes en total hay?",
    "¿Cuál es la ruta más popular?",
    "¿Cuál es la duración promedio?",
    "¿Cuántos usuarios son subscribers?",
    "Dame las 5 estaciones más usadas",
    "¿En qué año hay más viajes?",
];

/// Greeting shown when a chat surface opens.
pub const WELCOME_MESSAGE: &str = "\
¡Hola! 👋 Soy tu asistente para analizar datos de CitiBike NYC.

Puedo responder preguntas sobre:
- 📊 Estadísticas de viajes
- 🗺️ Rutas y estaciones populares
- ⏱️ Duraciones y patrones temporales
- 👥 Tipos de usuarios

**¿Qué te gustaría saber?**";

/// Build the system instruction seeded at the start of every conversation.
///
/// The instruction pins the model to the one table it may query, spells out
/// the correction loop for failed queries, and keeps the analyst voice in
/// Spanish.
pub fn build_system_instruction() -> String {
    format!(
        "\
# 🧠 Agente Analista de Datos SQL

Eres un analista de datos experto que se especializa en escribir consultas SQL para Google BigQuery.
Tu única tarea es convertir las preguntas de los usuarios, hechas en lenguaje natural, en consultas SQL funcionales y precisas.

## El Contexto de los Datos

Tienes acceso a una sola tabla llamada `{TABLE_NAME}`.
Este es el esquema de la tabla:

{TABLE_SCHEMA}

## Tu Proceso de Pensamiento

1. **Analiza la Pregunta del Usuario**: Comprende profundamente qué métricas, agregaciones, filtros y ordenamientos está pidiendo el usuario.
2. **Construye la Consulta SQL**: Escribe una consulta SQL para BigQuery que responda a la pregunta.
   - **SIEMPRE** usa el nombre completo de la tabla: `{TABLE_NAME}`.
   - Presta atención a los tipos de datos. Por ejemplo, `tripduration` está en segundos.
   - No hagas suposiciones. Si la pregunta es ambigua, es mejor que la consulta falle a que devuelva datos incorrectos.
3. **Ejecuta la Consulta**: Usa la herramienta `run_sql_query` para ejecutar el SQL que has escrito.
4. **Interpreta los Resultados**: La herramienta te devolverá los datos en formato de texto (Markdown) o un mensaje de error.
   - Si obtienes datos, preséntalos al usuario de forma clara y responde a su pregunta original en un lenguaje natural y amigable.
   - Si obtienes un error, analiza el error, corrige tu consulta SQL y vuelve a intentarlo. No le muestres el error de SQL al usuario directamente a menos que no puedas solucionarlo. Explícale el problema en términos sencillos.

## Guía de Comunicación

- Tu respuesta final debe ser en español.
- No le digas al usuario que estás escribiendo SQL. Actúa como un analista que simplemente \"encuentra\" la respuesta.
- Si una consulta no devuelve resultados, dilo claramente. Por ejemplo: \"No encontré viajes que cumplan con esos criterios\".
- Si la pregunta es sobre la \"ruta más popular\", asume que se refiere a la combinación de `start_station_name` y `end_station_name`.

Empieza ahora."
    )
}

//! Repository for the `qtype_ome*_options` tables.

use omero_qtype_core::image_reference::repository_url;
use omero_qtype_core::migration::{BindingColumn, QuestionImageBinding};
use omero_qtype_core::qtype::QuestionType;
use omero_qtype_core::types::DbId;
use omero_qtype_core::viewer::format_focusable_rois;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

use crate::models::question_options::{CreateQuestionOptions, QuestionOptions};
use crate::DbPool;

/// Column list for full options queries, without the multichoice-only columns.
const COLUMNS: &str = "id, questionid, single, shuffleanswers, answernumbering, \
    correctfeedback, partiallycorrectfeedback, incorrectfeedback, shownumcorrect, \
    omeroimageurl, focusablerois";

/// Extra columns carried by question types with structured image properties.
const IMAGE_PROPERTY_COLUMNS: &str = "omeroimagelocked, omeroimageproperties";

/// Reads and writes question options rows.
pub struct QuestionOptionsRepo;

impl QuestionOptionsRepo {
    /// Insert the options of a new question, returning the created row.
    pub async fn create(
        pool: &DbPool,
        qtype: QuestionType,
        input: &CreateQuestionOptions,
    ) -> Result<QuestionOptions, sqlx::Error> {
        let table = qtype.options_table();
        let properties = input
            .image_properties
            .as_ref()
            .map(|p| p.to_json())
            .transpose()
            .map_err(|e| sqlx::Error::Encode(Box::new(e)))?;

        let query = if qtype.has_image_properties() {
            format!(
                "INSERT INTO {table}
                    (questionid, single, shuffleanswers, answernumbering, correctfeedback,
                     partiallycorrectfeedback, incorrectfeedback, shownumcorrect,
                     omeroimageurl, focusablerois, omeroimagelocked, omeroimageproperties)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                 RETURNING {}",
                select_columns(qtype)
            )
        } else {
            format!(
                "INSERT INTO {table}
                    (questionid, single, shuffleanswers, answernumbering, correctfeedback,
                     partiallycorrectfeedback, incorrectfeedback, shownumcorrect,
                     omeroimageurl, focusablerois)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                 RETURNING {}",
                select_columns(qtype)
            )
        };

        let mut q = sqlx::query_as::<_, QuestionOptions>(&query)
            .bind(input.question_id)
            .bind(input.single)
            .bind(input.shuffle_answers)
            .bind(&input.answer_numbering)
            .bind(&input.correct_feedback)
            .bind(&input.partially_correct_feedback)
            .bind(&input.incorrect_feedback)
            .bind(input.show_num_correct)
            .bind(repository_url(input.image_id))
            .bind(format_focusable_rois(&input.focusable_rois));
        if qtype.has_image_properties() {
            q = q.bind(input.image_locked).bind(properties);
        }
        q.fetch_one(pool).await
    }

    /// Find the options of a question.
    pub async fn find_by_question(
        pool: &DbPool,
        qtype: QuestionType,
        question_id: DbId,
    ) -> Result<Option<QuestionOptions>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM {} WHERE questionid = ?",
            select_columns(qtype),
            qtype.options_table()
        );
        sqlx::query_as::<_, QuestionOptions>(&query)
            .bind(question_id)
            .fetch_optional(pool)
            .await
    }

    /// Load the image binding of every row, ordered by id. Only `id`,
    /// `omeroimageurl` and the requested `columns` are read.
    pub async fn list_bindings(
        conn: &mut SqliteConnection,
        table: &str,
        columns: &[BindingColumn],
    ) -> Result<Vec<QuestionImageBinding>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM {table} ORDER BY id",
            binding_select_list(columns)
        );
        let rows = sqlx::query(&query).fetch_all(&mut *conn).await?;
        rows.iter().map(|row| binding_from_row(row, columns)).collect()
    }

    /// Load the image binding of one row.
    pub async fn find_binding(
        conn: &mut SqliteConnection,
        table: &str,
        id: DbId,
        columns: &[BindingColumn],
    ) -> Result<Option<QuestionImageBinding>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM {table} WHERE id = ?",
            binding_select_list(columns)
        );
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
        row.map(|row| binding_from_row(&row, columns)).transpose()
    }

    /// Write `columns` of a binding back to its row. Returns the number of
    /// rows affected.
    pub async fn update_binding(
        conn: &mut SqliteConnection,
        table: &str,
        binding: &QuestionImageBinding,
        columns: &[BindingColumn],
    ) -> Result<u64, sqlx::Error> {
        if columns.is_empty() {
            return Ok(0);
        }
        let assignments = columns
            .iter()
            .map(|c| format!("{} = ?", c.name()))
            .collect::<Vec<_>>()
            .join(", ");
        let query = format!("UPDATE {table} SET {assignments} WHERE id = ?");

        let mut q = sqlx::query(&query);
        for column in columns {
            q = match column {
                BindingColumn::ImageUrl => q.bind(&binding.image_url),
                BindingColumn::ImageLocked => q.bind(binding.image_locked.unwrap_or(false)),
                BindingColumn::ImageProperties => q.bind(&binding.image_properties),
                BindingColumn::FocusableRois => {
                    q.bind(binding.focusable_rois.clone().unwrap_or_default())
                }
            };
        }
        let result = q.bind(binding.id).execute(&mut *conn).await?;
        Ok(result.rows_affected())
    }
}

fn select_columns(qtype: QuestionType) -> String {
    if qtype.has_image_properties() {
        format!("{COLUMNS}, {IMAGE_PROPERTY_COLUMNS}")
    } else {
        COLUMNS.to_string()
    }
}

fn binding_select_list(columns: &[BindingColumn]) -> String {
    let mut names = vec!["id", BindingColumn::ImageUrl.name()];
    names.extend(
        columns
            .iter()
            .filter(|c| **c != BindingColumn::ImageUrl)
            .map(BindingColumn::name),
    );
    names.join(", ")
}

fn binding_from_row(
    row: &SqliteRow,
    columns: &[BindingColumn],
) -> Result<QuestionImageBinding, sqlx::Error> {
    let mut binding = QuestionImageBinding {
        id: row.try_get("id")?,
        image_url: row.try_get(BindingColumn::ImageUrl.name())?,
        image_locked: None,
        image_properties: None,
        focusable_rois: None,
    };
    for column in columns {
        match column {
            BindingColumn::ImageUrl => {}
            BindingColumn::ImageLocked => {
                binding.image_locked = Some(row.try_get(column.name())?);
            }
            BindingColumn::ImageProperties => {
                binding.image_properties = row.try_get(column.name())?;
            }
            BindingColumn::FocusableRois => {
                binding.focusable_rois = Some(row.try_get(column.name())?);
            }
        }
    }
    Ok(binding)
}

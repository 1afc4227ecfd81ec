use crate::error::Result;
use crate::models::exam::ExamResult;
use crate::services::grading_service::percentage_of;
use rust_decimal::prelude::ToPrimitive;
use rust_xlsxwriter::*;

pub struct ExportService;

impl ExportService {
    /// XLSX workbook with one row per platform-scored result of an exam.
    pub fn generate_results_xlsx(exam_title: &str, results: &[ExamResult]) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name("Results")?;

        let header_bg = Color::RGB(0x0F172A);
        let border_color = Color::RGB(0xE2E8F0);
        let pass_color = Color::RGB(0x10B981);
        let fail_color = Color::RGB(0xEF4444);

        let columns = [
            ("#", 6.0),
            ("Student", 28.0),
            ("Email", 32.0),
            ("Score", 10.0),
            ("Total", 10.0),
            ("Percentage", 12.0),
            ("Result", 10.0),
            ("Submitted at", 22.0),
        ];
        for (i, (_, width)) in columns.iter().enumerate() {
            worksheet.set_column_width(i as u16, *width)?;
        }

        let title_format = Format::new()
            .set_font_size(14)
            .set_bold()
            .set_align(FormatAlign::CenterAcross)
            .set_align(FormatAlign::VerticalCenter);
        worksheet.set_row_height(0, 30)?;
        worksheet.merge_range(
            0,
            0,
            0,
            (columns.len() - 1) as u16,
            &format!("{} ({} results)", exam_title, results.len()),
            &title_format,
        )?;

        let header_format = Format::new()
            .set_bold()
            .set_font_size(10)
            .set_font_color(Color::White)
            .set_background_color(header_bg)
            .set_align(FormatAlign::Center)
            .set_border(FormatBorder::Thin)
            .set_border_color(border_color);
        let header_row = 1;
        for (i, (name, _)) in columns.iter().enumerate() {
            worksheet.write_string_with_format(header_row, i as u16, *name, &header_format)?;
        }

        let base_fmt = Format::new()
            .set_font_size(10)
            .set_border(FormatBorder::Thin)
            .set_border_color(border_color);
        let center_fmt = base_fmt.clone().set_align(FormatAlign::Center);

        let data_start_row = 2;
        for (idx, result) in results.iter().enumerate() {
            let row = data_start_row + idx as u32;
            let percentage = percentage_of(result.score, result.total_marks)
                .to_f64()
                .unwrap_or(0.0);

            worksheet.write_number_with_format(row, 0, (idx + 1) as f64, &center_fmt)?;
            worksheet.write_string_with_format(row, 1, &result.student_name, &base_fmt)?;
            worksheet.write_string_with_format(row, 2, &result.student_email, &base_fmt)?;
            worksheet.write_number_with_format(row, 3, result.score, &center_fmt)?;
            worksheet.write_number_with_format(row, 4, result.total_marks, &center_fmt)?;
            worksheet.write_number_with_format(row, 5, percentage, &center_fmt)?;

            let (label, color) = if result.passed {
                ("Pass", pass_color)
            } else {
                ("Fail", fail_color)
            };
            let result_fmt = center_fmt.clone().set_bold().set_font_color(color);
            worksheet.write_string_with_format(row, 6, label, &result_fmt)?;

            let submitted = result
                .submitted_at
                .map(|d| d.format("%Y-%m-%d %H:%M UTC").to_string())
                .unwrap_or_else(|| "-".to_string());
            worksheet.write_string_with_format(row, 7, &submitted, &center_fmt)?;
        }

        worksheet.set_freeze_panes(2, 0)?;
        if !results.is_empty() {
            worksheet.autofilter(
                header_row,
                0,
                data_start_row + results.len() as u32 - 1,
                (columns.len() - 1) as u16,
            )?;
        }

        let buffer = workbook.save_to_buffer()?;
        Ok(buffer)
    }
}

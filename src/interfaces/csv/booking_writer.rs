use crate::domain::booking::Booking;
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct BookingRow<'a> {
    id: &'a str,
    details: String,
}

/// Writes bookings as CSV: the id, then the remaining fields as compact JSON.
pub struct BookingWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> BookingWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(sink),
        }
    }

    pub fn write_bookings<'a, I>(&mut self, bookings: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a Booking>,
    {
        // Header goes out even for an empty collection.
        self.writer.write_record(["id", "details"])?;
        for booking in bookings {
            self.writer.serialize(BookingRow {
                id: &booking.id,
                details: serde_json::to_string(&booking.details)?,
            })?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

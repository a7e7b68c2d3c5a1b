//! Navigate-and-play composites.
//!
//! Each one stops the backend, moves the pointer, loads the new selection and
//! starts playback, awaiting every step before the next so the backend is
//! never asked to play while a load is in flight.

use core_library::models::Container;
use tracing::instrument;

use crate::error::Result;
use crate::player::PlayCore;

impl PlayCore {
    #[instrument(skip(self))]
    pub async fn move_next_and_play(&self) -> Result<()> {
        self.backend().stop().await?;
        self.move_next().await?;
        self.load_now_playing().await?;
        self.backend().play().await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn move_previous_and_play(&self) -> Result<()> {
        self.backend().stop().await?;
        self.move_previous();
        self.load_now_playing().await?;
        self.backend().play().await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn move_to_and_play(&self, index: usize) -> Result<()> {
        self.backend().stop().await?;
        self.move_to(index);
        self.load_now_playing().await?;
        self.backend().play().await?;
        Ok(())
    }

    /// Bind `container`, load its items and play from the first one.
    #[instrument(skip(self, container), fields(source = %container.id))]
    pub async fn replace_source_and_move_to_start(&self, container: Container) -> Result<()> {
        self.bind_source(container);
        self.load_from_source().await?;
        self.backend().stop().await?;
        self.move_to(0);
        self.load_now_playing().await?;
        self.backend().play().await?;
        Ok(())
    }
}
